//! Dataset registration on the dataset service
//!
//! A dataset must exist on the server before loaders or jobs can be created
//! over it. Items are addressed by their keys; the first key is what job
//! filters compare against.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::info;

use crate::config::normalize_endpoint;
use crate::error::{LoaderError, Result};
use crate::protocol::common::status::Code as StatusCode;
use crate::protocol::common::Status;
use crate::protocol::dataset::create_dataset_request::Type;
use crate::protocol::dataset::{CreateDatasetRequest, DataItem, DeleteDatasetRequest};
use crate::protocol::DatasetSvcClient;

/// Storage backend the server reads items from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetType {
    #[default]
    Filesystem,
    Lmdb,
    /// Synthetic items, for tests
    Dummy,
}

impl From<DatasetType> for Type {
    fn from(ty: DatasetType) -> Self {
        match ty {
            DatasetType::Filesystem => Type::Filesystem,
            DatasetType::Lmdb => Type::Lmdb,
            DatasetType::Dummy => Type::Dummy,
        }
    }
}

/// Description of a dataset to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub name: String,
    pub location: String,
    pub ty: DatasetType,
    pub items: Vec<Vec<String>>,
    pub weights: Vec<u32>,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, location: impl Into<String>, ty: DatasetType) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ty,
            items: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Append one item identified by `keys`
    pub fn add_item<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.push(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_weights(mut self, weights: Vec<u32>) -> Self {
        self.weights = weights;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn create_request(&self) -> CreateDatasetRequest {
        CreateDatasetRequest {
            name: self.name.clone(),
            location: self.location.clone(),
            r#type: Type::from(self.ty) as i32,
            items: self
                .items
                .iter()
                .map(|keys| DataItem { keys: keys.clone() })
                .collect(),
            weights: self.weights.clone(),
        }
    }
}

/// `Rpc` error if the response carries an `Err` status
fn check_status(method: &'static str, status: Option<&Status>) -> Result<()> {
    match status {
        Some(status) if status.code == StatusCode::Err as i32 => Err(LoaderError::Rpc {
            method,
            code: tonic::Code::Internal,
            message: status.msg.clone(),
        }),
        _ => Ok(()),
    }
}

/// Client of the dataset service
pub struct DatasetClient {
    client: DatasetSvcClient<Channel>,
}

impl DatasetClient {
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint);
        let failed = |reason: String| LoaderError::ConnectionFailed {
            endpoint: endpoint.clone(),
            reason,
        };
        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|e| failed(e.to_string()))?
            .connect_timeout(Duration::from_secs(10))
            .connect()
            .await
            .map_err(|e| failed(e.to_string()))?;
        Ok(Self {
            client: DatasetSvcClient::new(channel),
        })
    }

    /// Register `spec`; `AlreadyExists` if the name is taken
    pub async fn create(&mut self, spec: &DatasetSpec) -> Result<()> {
        let resp = self
            .client
            .create_dataset(spec.create_request())
            .await
            .map_err(|s| LoaderError::from_status("CreateDataset", s))?
            .into_inner();
        check_status("CreateDataset", resp.status.as_ref())?;
        info!(
            "Dataset {} created with {} items at {}",
            spec.name,
            spec.len(),
            spec.location
        );
        Ok(())
    }

    /// Remove dataset `name`; `NotFound` if it was never created
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        let resp = self
            .client
            .delete_dataset(DeleteDatasetRequest { name: name.into() })
            .await
            .map_err(|s| LoaderError::from_status("DeleteDataset", s))?
            .into_inner();
        check_status("DeleteDataset", resp.status.as_ref())?;
        info!("Dataset {} deleted", name);
        Ok(())
    }
}
