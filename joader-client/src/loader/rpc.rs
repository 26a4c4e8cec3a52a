//! Control-plane RPC seam
//!
//! The fetch worker and the client talk to the server through
//! [`LoaderService`]; [`GrpcLoaderService`] is the tonic implementation.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::protocol::common::status::Code as StatusCode;
use crate::protocol::dataloader::*;
use crate::protocol::DataLoaderSvcClient;
use crate::shm::SlotRef;

/// Loader metadata returned by `CreateDataloader`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderHandle {
    pub loader_id: u64,
    pub length: u64,
    pub shm_path: String,
}

/// Operations of the dataloader service
#[tonic::async_trait]
pub trait LoaderService: Send + 'static {
    /// Create (or join) loader `name` over `dataset_name`
    async fn create_loader(&mut self, dataset_name: &str, name: &str, nums: u32)
        -> Result<LoaderHandle>;

    /// Fetch ready record locations, in server order
    async fn next(&mut self, loader_id: u64, batch_size: i32) -> Result<Vec<SlotRef>>;

    /// Remove this host from the loader
    async fn delete_loader(&mut self, dataset_name: &str, name: &str)
        -> Result<DeleteDataloaderResponse>;

    /// Rewind server-side iteration state
    async fn reset_loader(&mut self, dataset_name: &str, name: &str) -> Result<()>;
}

/// Opens new connections to the service
///
/// The worker and the client's control path each hold their own connection.
#[tonic::async_trait]
pub trait Connector: Send + Sync + 'static {
    type Service: LoaderService;

    async fn connect(&self) -> Result<Self::Service>;

    /// Endpoint description for logs and errors
    fn endpoint(&self) -> String;
}

/// Connector for the tonic client
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    endpoint: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl GrpcConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            endpoint: config.server_addr.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        }
    }
}

#[tonic::async_trait]
impl Connector for GrpcConnector {
    type Service = GrpcLoaderService;

    async fn connect(&self) -> Result<GrpcLoaderService> {
        let failed = |reason: String| LoaderError::ConnectionFailed {
            endpoint: self.endpoint.clone(),
            reason,
        };
        info!("Connecting to dataloader service at {}", self.endpoint);
        let channel = Endpoint::from_shared(self.endpoint.clone())
            .map_err(|e| failed(e.to_string()))?
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .connect()
            .await
            .map_err(|e| failed(e.to_string()))?;
        Ok(GrpcLoaderService::new(channel))
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

/// tonic-backed dataloader service
#[derive(Debug, Clone)]
pub struct GrpcLoaderService {
    client: DataLoaderSvcClient<Channel>,
}

impl GrpcLoaderService {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: DataLoaderSvcClient::new(channel),
        }
    }
}

#[tonic::async_trait]
impl LoaderService for GrpcLoaderService {
    async fn create_loader(
        &mut self,
        dataset_name: &str,
        name: &str,
        nums: u32,
    ) -> Result<LoaderHandle> {
        let req = CreateDataloaderRequest {
            name: name.into(),
            dataset_name: dataset_name.into(),
            nums,
        };
        let resp = self
            .client
            .create_dataloader(req)
            .await
            .map_err(|s| LoaderError::from_status("CreateDataloader", s))?
            .into_inner();

        if let Some(status) = resp.status.as_ref() {
            if status.code == StatusCode::Err as i32 {
                return Err(LoaderError::Rpc {
                    method: "CreateDataloader",
                    code: tonic::Code::Internal,
                    message: status.msg.clone(),
                });
            }
        }
        Ok(LoaderHandle {
            loader_id: resp.loader_id,
            length: resp.length,
            shm_path: resp.shm_path,
        })
    }

    async fn next(&mut self, loader_id: u64, batch_size: i32) -> Result<Vec<SlotRef>> {
        let resp = self
            .client
            .next(NextRequest {
                loader_id,
                batch_size,
            })
            .await
            .map_err(|s| LoaderError::from_status("Next", s))?
            .into_inner();
        slots_from_response(resp)
    }

    async fn delete_loader(
        &mut self,
        dataset_name: &str,
        name: &str,
    ) -> Result<DeleteDataloaderResponse> {
        let req = DeleteDataloaderRequest {
            name: name.into(),
            dataset_name: dataset_name.into(),
        };
        let resp = self
            .client
            .delete_dataloader(req)
            .await
            .map_err(|s| LoaderError::from_status("DeleteDataloader", s))?;
        debug!("Deleted loader {} on {}", name, dataset_name);
        Ok(resp.into_inner())
    }

    async fn reset_loader(&mut self, dataset_name: &str, name: &str) -> Result<()> {
        let req = ResetDataloaderRequest {
            name: name.into(),
            dataset_name: dataset_name.into(),
        };
        self.client
            .reset_dataloader(req)
            .await
            .map_err(|s| LoaderError::from_status("ResetDataloader", s))?;
        Ok(())
    }
}

/// Zip the parallel `address`/`read_off` arrays of a `Next` response
pub fn slots_from_response(resp: NextResponse) -> Result<Vec<SlotRef>> {
    if resp.address.len() != resp.read_off.len() {
        return Err(LoaderError::protocol(format!(
            "Next returned {} addresses but {} read offsets",
            resp.address.len(),
            resp.read_off.len()
        )));
    }
    Ok(resp
        .address
        .into_iter()
        .zip(resp.read_off)
        .map(|(address, read_offset)| SlotRef::new(address, read_offset))
        .collect())
}
