//! Streaming shared-memory loader
//!
//! A [`LoaderClient`] owns one background [`FetchWorker`] that pulls record
//! locations over gRPC; the records themselves are read from shared memory.

pub mod channel;
pub mod client;
pub mod rpc;
pub mod worker;

pub use channel::{Command, QueueItem};
pub use client::{DeleteOutcome, LoaderClient, LoaderInfo, ShutdownStatus};
pub use rpc::{Connector, GrpcConnector, GrpcLoaderService, LoaderHandle, LoaderService};
pub use worker::FetchWorker;
