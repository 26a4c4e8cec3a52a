//! Joader client - streaming dataset loader over shared memory
//!
//! This crate provides the client side of the Joader data loading service:
//! - Loader lifecycle over gRPC (create, next, reset, delete)
//! - A background fetch worker feeding a bounded queue of record locations
//! - Zero-copy record access in the server's shared-memory region
//! - The non-streaming job path with typed values
//! - Dataset registration

pub mod config;
pub mod dataset;
pub mod error;
pub mod job;
pub mod loader;
pub mod metrics;
pub mod protocol;
pub mod runtime;
pub mod shm;
#[cfg(feature = "python")]
pub mod python_api;

pub use config::{LoaderConfig, RetryPolicy};
pub use dataset::{DatasetClient, DatasetSpec, DatasetType};
pub use error::{LoaderError, Result};
pub use job::{JobClient, JobFilter, Value};
pub use loader::{DeleteOutcome, LoaderClient, LoaderInfo, ShutdownStatus};
pub use runtime::LoaderRuntime;
pub use shm::{SharedMemoryRegion, SlotRef};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Default capacity of the data queue between worker and client
pub const DEFAULT_DATA_QUEUE_CAPACITY: usize = 512;

/// Default sleep after an empty `Next`, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Default wait for the worker handshake, in seconds
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 30;

/// Default wait for the worker to stop during delete, in seconds
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
