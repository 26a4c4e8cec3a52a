//! Wire types and gRPC clients
//!
//! Generated from `proto/*.proto` with prost/tonic and checked in, so the
//! crate builds without `protoc`. Regenerate after editing the protos.

pub mod common;
pub mod dataloader;
pub mod dataset;
pub mod job;

pub use dataloader::data_loader_svc_client::DataLoaderSvcClient;
pub use dataset::dataset_svc_client::DatasetSvcClient;
pub use job::job_svc_client::JobSvcClient;
