//! Channels between the fetch worker and the client
//!
//! - handshake: one-shot, worker -> client, carries the created loader
//! - command: capacity 1, client -> worker
//! - data: bounded, worker -> client, carries record locations in server order

use tokio::sync::{mpsc, oneshot};

use super::rpc::LoaderHandle;
use crate::error::{LoaderError, Result};
use crate::shm::SlotRef;

/// Item on the data queue
#[derive(Debug)]
pub enum QueueItem {
    /// A ready record
    Record(SlotRef),
    /// The worker stopped; nothing follows
    End,
    /// The worker hit an unrecoverable error; nothing follows
    Failed(LoaderError),
}

/// Command sent to the worker
#[derive(Debug)]
pub enum Command {
    /// Leave the fetch loop and push `End`
    Stop,
    /// Stop issuing `Next` until `Resume`; `ack` fires once the worker is idle
    Pause { ack: oneshot::Sender<()> },
    /// Continue after `Pause`
    Resume,
}

/// Worker-side ends
#[derive(Debug)]
pub struct WorkerChannels {
    pub handshake_tx: oneshot::Sender<Result<LoaderHandle>>,
    pub command_rx: mpsc::Receiver<Command>,
    pub data_tx: mpsc::Sender<QueueItem>,
}

/// Client-side ends
#[derive(Debug)]
pub struct ClientChannels {
    pub handshake_rx: oneshot::Receiver<Result<LoaderHandle>>,
    pub command_tx: mpsc::Sender<Command>,
    pub data_rx: mpsc::Receiver<QueueItem>,
}

/// Create the channel set for one loader with a data queue of `capacity`
pub fn control_channel(capacity: usize) -> (WorkerChannels, ClientChannels) {
    let (handshake_tx, handshake_rx) = oneshot::channel();
    let (command_tx, command_rx) = mpsc::channel(1);
    let (data_tx, data_rx) = mpsc::channel(capacity);
    (
        WorkerChannels {
            handshake_tx,
            command_rx,
            data_tx,
        },
        ClientChannels {
            handshake_rx,
            command_tx,
            data_rx,
        },
    )
}
