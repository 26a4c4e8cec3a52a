//! Consumer-facing loader client
//!
//! Spawns the fetch worker, waits for its handshake, maps the shared-memory
//! region and resolves queued record locations into record bytes.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::channel::{ClientChannels, Command, QueueItem};
use super::rpc::{Connector, GrpcConnector, LoaderHandle, LoaderService};
use super::worker;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::metrics::LoaderMetrics;
use crate::protocol::dataloader::DeleteDataloaderResponse;
use crate::shm::{SharedMemoryRegion, SlotRef};

/// Snapshot of a loader's identity and progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderInfo {
    pub dataset_name: String,
    pub name: String,
    pub loader_id: u64,
    pub length: u64,
    pub shm_path: String,
    pub records_read: u64,
}

/// How the worker ended during `delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStatus {
    /// Worker observed the stop command and exited
    Graceful,
    /// Worker missed the grace period and was aborted
    ForceTerminated { grace: Duration },
}

/// Result of `LoaderClient::delete`
///
/// Worker shutdown and the `DeleteDataloader` call can fail independently;
/// both are reported.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub shutdown: ShutdownStatus,
    pub response: Result<DeleteDataloaderResponse>,
}

impl DeleteOutcome {
    /// `ShutdownTimeout` if the worker had to be force-terminated
    pub fn shutdown_error(&self) -> Option<LoaderError> {
        match self.shutdown {
            ShutdownStatus::Graceful => None,
            ShutdownStatus::ForceTerminated { grace } => {
                Some(LoaderError::ShutdownTimeout { grace })
            }
        }
    }

    /// Graceful shutdown and a successful delete RPC
    pub fn is_clean(&self) -> bool {
        self.shutdown == ShutdownStatus::Graceful && self.response.is_ok()
    }

    /// Collapse into one result: the RPC error if the call failed, then
    /// `ShutdownTimeout` if the worker was force-terminated
    pub fn into_result(self) -> Result<DeleteDataloaderResponse> {
        let response = self.response?;
        match self.shutdown {
            ShutdownStatus::Graceful => Ok(response),
            ShutdownStatus::ForceTerminated { grace } => {
                Err(LoaderError::ShutdownTimeout { grace })
            }
        }
    }
}

/// A streaming loader over a remote dataset partition
///
/// Records are located through the data queue and read from shared memory.
/// After reading a record, call [`mark_consumed`](Self::mark_consumed) so the
/// server can reuse its slot; a slot must not be relied upon once marked.
pub struct LoaderClient<C: Connector = GrpcConnector> {
    config: LoaderConfig,
    loader: LoaderHandle,
    region: SharedMemoryRegion,
    command_tx: mpsc::Sender<Command>,
    data_rx: mpsc::Receiver<QueueItem>,
    worker: Option<JoinHandle<()>>,
    connector: Arc<C>,
    control: Option<C::Service>,
    current: Option<SlotRef>,
    finished: bool,
    metrics: Arc<LoaderMetrics>,
}

impl LoaderClient<GrpcConnector> {
    /// Create a loader against a gRPC server, spawning the worker on the
    /// current tokio runtime
    pub async fn create(config: LoaderConfig) -> Result<Self> {
        let connector = GrpcConnector::from_config(&config);
        Self::create_with(&Handle::current(), connector, config).await
    }
}

impl<C: Connector> LoaderClient<C> {
    /// Create a loader through `connector`, spawning the worker on `runtime`
    pub async fn create_with(runtime: &Handle, connector: C, config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let connector = Arc::new(connector);
        let metrics = Arc::new(LoaderMetrics::new());

        let (handle, channels) =
            worker::spawn(runtime, connector.clone(), config.clone(), metrics.clone());
        let ClientChannels {
            handshake_rx,
            command_tx,
            data_rx,
        } = channels;

        let loader = match tokio::time::timeout(config.handshake_timeout, handshake_rx).await {
            Ok(Ok(Ok(loader))) => loader,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(_)) => {
                return Err(LoaderError::WorkerFailed {
                    reason: "worker exited before handshake".into(),
                })
            }
            Err(_) => {
                handle.abort();
                error!(
                    "No handshake from worker for {} within {:?}",
                    config.name, config.handshake_timeout
                );
                return Err(LoaderError::HandshakeTimeout {
                    timeout: config.handshake_timeout,
                });
            }
        };

        let region = match SharedMemoryRegion::open(&loader.shm_path) {
            Ok(region) => region,
            Err(e) => {
                handle.abort();
                return Err(e);
            }
        };

        info!(
            "Loader {} ready: {} records, {} bytes mapped from {}",
            config.name,
            loader.length,
            region.len(),
            region.path().display()
        );

        Ok(Self {
            config,
            loader,
            region,
            command_tx,
            data_rx,
            worker: Some(handle),
            connector,
            control: None,
            current: None,
            finished: false,
            metrics,
        })
    }

    /// Next record, copied out of shared memory
    pub async fn next(&mut self) -> Result<Bytes> {
        let slot = self.next_slot().await?;
        let payload = self.region.read_payload(slot)?;
        self.metrics.records_read.inc();
        self.metrics.bytes_read.inc_by(payload.len() as u64);
        Ok(Bytes::copy_from_slice(payload))
    }

    /// Next record, borrowed from shared memory
    ///
    /// The borrow ends before `mark_consumed` can be called, so the slice can
    /// never outlive the slot.
    pub async fn next_ref(&mut self) -> Result<&[u8]> {
        let slot = self.next_slot().await?;
        let payload = self.region.read_payload(slot)?;
        self.metrics.records_read.inc();
        self.metrics.bytes_read.inc_by(payload.len() as u64);
        Ok(payload)
    }

    /// Next record location without touching shared memory
    pub async fn next_dummy(&mut self) -> Result<SlotRef> {
        self.next_slot().await
    }

    /// Clear this reader's flag on the record last returned
    ///
    /// Must be called before the slot can be handed out again, otherwise the
    /// server may overwrite it mid-read.
    pub fn mark_consumed(&mut self) -> Result<()> {
        let slot = self
            .current
            .take()
            .ok_or_else(|| LoaderError::protocol("no record outstanding to mark consumed"))?;
        self.region.mark_consumed(slot)
    }

    async fn next_slot(&mut self) -> Result<SlotRef> {
        if self.finished {
            return Err(LoaderError::EndOfStream);
        }
        match self.data_rx.recv().await {
            Some(QueueItem::Record(slot)) => {
                self.metrics.queue_depth.dec();
                self.current = Some(slot);
                Ok(slot)
            }
            Some(QueueItem::End) | None => {
                debug!("Loader {} reached end of stream", self.loader.loader_id);
                self.finished = true;
                Err(LoaderError::EndOfStream)
            }
            Some(QueueItem::Failed(e)) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Rewind server-side iteration
    ///
    /// The worker is paused, locations already queued are discarded (their
    /// slots are marked consumed), the server is reset, then the worker
    /// resumes. A stream that has already ended stays ended.
    pub async fn reset(&mut self) -> Result<()> {
        let paused = self.pause_worker().await;
        let discarded = self.drain_queued();
        self.current = None;
        debug!(
            "Reset of loader {}: discarded {} queued records",
            self.loader.loader_id, discarded
        );

        let dataset_name = self.config.dataset_name.clone();
        let name = self.config.name.clone();
        let result = match self.control().await {
            Ok(control) => control.reset_loader(&dataset_name, &name).await,
            Err(e) => Err(e),
        };

        if paused && self.command_tx.send(Command::Resume).await.is_err() {
            warn!("Worker for loader {} gone before resume", self.loader.loader_id);
        }
        result
    }

    /// Pause the worker, draining the queue until it acknowledges
    async fn pause_worker(&mut self) -> bool {
        if self.worker.as_ref().map_or(true, |h| h.is_finished()) {
            return false;
        }
        let (ack_tx, mut ack_rx) = oneshot::channel();
        if self
            .command_tx
            .send(Command::Pause { ack: ack_tx })
            .await
            .is_err()
        {
            return false;
        }
        loop {
            tokio::select! {
                ack = &mut ack_rx => return ack.is_ok(),
                item = self.data_rx.recv() => match item {
                    Some(item) => self.discard(item),
                    None => return false,
                }
            }
        }
    }

    /// Drop everything currently queued, returning how many records were dropped
    fn drain_queued(&mut self) -> usize {
        let mut discarded = 0;
        while let Ok(item) = self.data_rx.try_recv() {
            if matches!(item, QueueItem::Record(_)) {
                discarded += 1;
            }
            self.discard(item);
        }
        discarded
    }

    fn discard(&mut self, item: QueueItem) {
        match item {
            QueueItem::Record(slot) => {
                self.metrics.queue_depth.dec();
                if let Err(e) = self.region.mark_consumed(slot) {
                    warn!("Could not release slot {:?}: {}", slot, e);
                }
            }
            QueueItem::End => self.finished = true,
            QueueItem::Failed(e) => {
                warn!("Worker for loader {} failed: {}", self.loader.loader_id, e);
                self.finished = true;
            }
        }
    }

    /// Stop the worker and delete the loader on the server
    ///
    /// The delete RPC is issued even when the worker had to be
    /// force-terminated.
    pub async fn delete(mut self) -> DeleteOutcome {
        let shutdown = self.stop_worker().await;
        let dataset_name = self.config.dataset_name.clone();
        let name = self.config.name.clone();
        let response = match self.control().await {
            Ok(control) => control.delete_loader(&dataset_name, &name).await,
            Err(e) => Err(e),
        };
        match &response {
            Ok(_) => info!(
                "Deleted loader {} after reading {} records",
                self.loader.loader_id,
                self.metrics.records_read.get()
            ),
            Err(e) => error!("Delete of loader {} failed: {}", self.loader.loader_id, e),
        }
        DeleteOutcome { shutdown, response }
    }

    /// Send stop and wait for the worker, draining the queue meanwhile so a
    /// worker blocked on a full queue can observe it
    async fn stop_worker(&mut self) -> ShutdownStatus {
        let Some(mut handle) = self.worker.take() else {
            return ShutdownStatus::Graceful;
        };
        let grace = self.config.shutdown_grace;
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);
        let mut stop_sent = false;
        let mut queue_open = true;

        loop {
            tokio::select! {
                joined = &mut handle => {
                    if let Err(e) = joined {
                        warn!("Worker for loader {} ended abnormally: {}", self.loader.loader_id, e);
                    }
                    return ShutdownStatus::Graceful;
                }
                _ = &mut deadline => {
                    handle.abort();
                    warn!(
                        "Worker for loader {} did not stop within {:?}, aborted",
                        self.loader.loader_id, grace
                    );
                    return ShutdownStatus::ForceTerminated { grace };
                }
                sent = self.command_tx.send(Command::Stop), if !stop_sent => {
                    stop_sent = true;
                    if sent.is_err() {
                        debug!("Worker already gone when stop was sent");
                    }
                }
                item = self.data_rx.recv(), if queue_open => match item {
                    Some(item) => self.discard(item),
                    None => queue_open = false,
                }
            }
        }
    }

    /// Control-plane service, connected on first use
    async fn control(&mut self) -> Result<&mut C::Service> {
        let service = match self.control.take() {
            Some(service) => service,
            None => self.connector.connect().await?,
        };
        Ok(self.control.insert(service))
    }

    /// Total records in the loader, as reported at creation
    pub fn len(&self) -> u64 {
        self.loader.length
    }

    pub fn is_empty(&self) -> bool {
        self.loader.length == 0
    }

    pub fn loader_id(&self) -> u64 {
        self.loader.loader_id
    }

    pub fn shm_path(&self) -> &str {
        &self.loader.shm_path
    }

    /// True once the stream has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn metrics(&self) -> &LoaderMetrics {
        &self.metrics
    }

    pub fn info(&self) -> LoaderInfo {
        LoaderInfo {
            dataset_name: self.config.dataset_name.clone(),
            name: self.config.name.clone(),
            loader_id: self.loader.loader_id,
            length: self.loader.length,
            shm_path: self.loader.shm_path.clone(),
            records_read: self.metrics.records_read.get(),
        }
    }
}

impl<C: Connector> Drop for LoaderClient<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = self.command_tx.try_send(Command::Stop);
            handle.abort();
        }
    }
}
