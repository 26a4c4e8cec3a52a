//! Background fetch worker
//!
//! Owns its own connection to the server. Creates the loader, then keeps
//! pulling ready record locations with `Next` and pushes them onto the
//! bounded data queue, which is where backpressure is applied.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::channel::{control_channel, ClientChannels, Command, QueueItem, WorkerChannels};
use super::rpc::{Connector, LoaderHandle, LoaderService};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::metrics::LoaderMetrics;
use crate::shm::SlotRef;

/// Why the fetch loop ended
#[derive(Debug)]
enum LoopExit {
    /// Stop command, or the client went away
    Stopped,
    /// Server reported the loader is used up
    Exhausted,
    /// Unrecoverable RPC error
    Failed(LoaderError),
    /// Data queue closed
    ConsumerGone,
}

/// Fetch worker for one loader
pub struct FetchWorker<C: Connector> {
    connector: Arc<C>,
    config: LoaderConfig,
    metrics: Arc<LoaderMetrics>,
}

/// Spawn a worker on `runtime` and return its task plus the client ends
pub fn spawn<C: Connector>(
    runtime: &Handle,
    connector: Arc<C>,
    config: LoaderConfig,
    metrics: Arc<LoaderMetrics>,
) -> (JoinHandle<()>, ClientChannels) {
    let (worker_ends, client_ends) = control_channel(config.queue_capacity);
    let worker = FetchWorker::new(connector, config, metrics);
    let handle = runtime.spawn(worker.run(worker_ends));
    (handle, client_ends)
}

impl<C: Connector> FetchWorker<C> {
    pub fn new(connector: Arc<C>, config: LoaderConfig, metrics: Arc<LoaderMetrics>) -> Self {
        Self {
            connector,
            config,
            metrics,
        }
    }

    /// Run until stopped, exhausted or failed
    pub async fn run(self, channels: WorkerChannels) {
        let WorkerChannels {
            handshake_tx,
            mut command_rx,
            data_tx,
        } = channels;

        let (mut service, loader) = match self.start().await {
            Ok(started) => started,
            Err(e) => {
                error!(
                    "Failed to create loader {} on {}: {}",
                    self.config.name, self.config.dataset_name, e
                );
                let _ = handshake_tx.send(Err(e));
                return;
            }
        };

        info!(
            "Loader {} created: id={} length={} shm={}",
            self.config.name, loader.loader_id, loader.length, loader.shm_path
        );
        let loader_id = loader.loader_id;
        if handshake_tx.send(Ok(loader)).is_err() {
            debug!("Client gave up before handshake, worker exiting");
            return;
        }

        let exit = self
            .fetch_loop(&mut service, loader_id, &mut command_rx, &data_tx)
            .await;
        debug!("Fetch loop for loader {} ended: {:?}", loader_id, exit);

        let last = match exit {
            LoopExit::Stopped | LoopExit::Exhausted => QueueItem::End,
            LoopExit::Failed(e) => QueueItem::Failed(e),
            LoopExit::ConsumerGone => return,
        };
        let _ = data_tx.send(last).await;
    }

    /// Connect and create the loader, retrying transient failures
    async fn start(&self) -> Result<(C::Service, LoaderHandle)> {
        let mut attempt = 0;
        loop {
            let result: Result<(C::Service, LoaderHandle)> = async {
                let mut service = self.connector.connect().await?;
                let loader = service
                    .create_loader(&self.config.dataset_name, &self.config.name, self.config.nums)
                    .await?;
                Ok((service, loader))
            }
            .await;

            match result {
                Err(e) if e.is_retryable() && attempt + 1 < self.config.retry.max_attempts => {
                    let delay = self.config.retry.delay(attempt);
                    warn!(
                        "Attempt {}/{} to create loader {} failed: {}, retrying in {:?}",
                        attempt + 1,
                        self.config.retry.max_attempts,
                        self.config.name,
                        e,
                        delay
                    );
                    self.metrics.rpc_retries.inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn fetch_loop(
        &self,
        service: &mut C::Service,
        loader_id: u64,
        command_rx: &mut mpsc::Receiver<Command>,
        data_tx: &mpsc::Sender<QueueItem>,
    ) -> LoopExit {
        loop {
            match command_rx.try_recv() {
                Ok(command) => {
                    if let Some(exit) = self.handle_command(Some(command), command_rx).await {
                        return exit;
                    }
                    continue;
                }
                Err(TryRecvError::Disconnected) => return LoopExit::Stopped,
                Err(TryRecvError::Empty) => {}
            }

            let slots = match self.next_with_retry(service, loader_id).await {
                Ok(slots) => slots,
                Err(e) if e.is_exhausted() => {
                    info!("Loader {} exhausted", loader_id);
                    return LoopExit::Exhausted;
                }
                Err(e) => {
                    error!("Next for loader {} failed: {}", loader_id, e);
                    return LoopExit::Failed(e);
                }
            };

            if slots.is_empty() {
                self.metrics.empty_polls.inc();
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    command = command_rx.recv() => {
                        if let Some(exit) = self.handle_command(command, command_rx).await {
                            return exit;
                        }
                    }
                }
                continue;
            }

            if let Err(exit) = self.push(slots, data_tx).await {
                return exit;
            }
        }
    }

    /// Push in server order, waiting while the queue is full
    async fn push(
        &self,
        slots: Vec<SlotRef>,
        data_tx: &mpsc::Sender<QueueItem>,
    ) -> std::result::Result<(), LoopExit> {
        for slot in slots {
            if data_tx.send(QueueItem::Record(slot)).await.is_err() {
                debug!("Data queue closed, worker exiting");
                return Err(LoopExit::ConsumerGone);
            }
            self.metrics.records_fetched.inc();
            self.metrics.queue_depth.inc();
        }
        Ok(())
    }

    async fn next_with_retry(
        &self,
        service: &mut C::Service,
        loader_id: u64,
    ) -> Result<Vec<SlotRef>> {
        let mut attempt = 0;
        loop {
            let started = Instant::now();
            match service.next(loader_id, self.config.batch_size).await {
                Ok(slots) => {
                    self.metrics.next_rpcs.inc();
                    self.metrics.next_latency.observe(started.elapsed());
                    return Ok(slots);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.config.retry.max_attempts => {
                    let delay = self.config.retry.delay(attempt);
                    warn!(
                        "Next attempt {}/{} for loader {} failed: {}, retrying in {:?}",
                        attempt + 1,
                        self.config.retry.max_attempts,
                        loader_id,
                        e,
                        delay
                    );
                    self.metrics.rpc_retries.inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a command; `Some` means the loop must end
    async fn handle_command(
        &self,
        command: Option<Command>,
        command_rx: &mut mpsc::Receiver<Command>,
    ) -> Option<LoopExit> {
        match command {
            Some(Command::Stop) | None => Some(LoopExit::Stopped),
            Some(Command::Resume) => None,
            Some(Command::Pause { ack }) => {
                debug!("Worker for {} paused", self.config.name);
                let _ = ack.send(());
                loop {
                    match command_rx.recv().await {
                        Some(Command::Resume) => {
                            debug!("Worker for {} resumed", self.config.name);
                            return None;
                        }
                        Some(Command::Pause { ack }) => {
                            let _ = ack.send(());
                        }
                        Some(Command::Stop) | None => return Some(LoopExit::Stopped),
                    }
                }
            }
        }
    }
}
