//! Tokio runtime for fetch workers
//!
//! Blocking callers (the binary, the Python binding) have no ambient
//! runtime, so workers run on a dedicated one owned here.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::{LoaderError, Result};

/// Configuration for the loader runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of threads for fetch workers
    pub fetch_threads: usize,
    /// Time given to in-flight tasks on shutdown
    pub shutdown_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fetch_threads: (num_cpus::get() / 2).clamp(1, 4),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Runtime hosting fetch workers
pub struct LoaderRuntime {
    runtime: Runtime,
    config: RuntimeConfig,
}

impl LoaderRuntime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.fetch_threads.max(1))
            .thread_name("joader-fetch")
            .enable_all()
            .build()
            .map_err(|e| LoaderError::WorkerFailed {
                reason: format!("failed to create fetch runtime: {}", e),
            })?;
        Ok(Self { runtime, config })
    }

    /// Spawn a task on the fetch runtime
    pub fn spawn_fetch<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    /// Run a future to completion, blocking the calling thread
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Handle for spawning workers from outside the runtime
    pub fn fetch_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Shut down, giving in-flight tasks the configured timeout
    pub fn shutdown(self) {
        self.runtime.shutdown_timeout(self.config.shutdown_timeout);
    }
}
