//! Non-streaming job client
//!
//! Each `next()` is one `Next` RPC returning decoded values directly, no
//! shared memory involved.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use super::value::Value;
use crate::config::normalize_endpoint;
use crate::error::{LoaderError, Result};
use crate::protocol::job::expr::Operation;
use crate::protocol::job::{Condition, CreateJobRequest, DeleteJobRequest, Expr, NextRequest};
use crate::protocol::JobSvcClient;

/// Key range a job is restricted to
///
/// Bounds compare against each item's first key: `start` is inclusive,
/// `end` exclusive. No bounds selects the whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn to_condition(&self) -> Condition {
        let bound = |op: Operation, rhs: &Option<String>| {
            rhs.as_ref().filter(|r| !r.is_empty()).map(|rhs| Expr {
                op: op as i32,
                rhs: rhs.clone(),
            })
        };
        Condition {
            exprs: [bound(Operation::Geq, &self.start), bound(Operation::Lt, &self.end)]
                .into_iter()
                .flatten()
                .collect(),
        }
    }
}

/// `CreateJob` request for job `name` over `dataset_name`
pub fn create_request(dataset_name: &str, name: &str, filter: &JobFilter) -> CreateJobRequest {
    CreateJobRequest {
        name: name.into(),
        dataset_name: dataset_name.into(),
        condition: Some(filter.to_condition()),
    }
}

/// A job over a remote dataset
#[derive(Debug)]
pub struct JobClient {
    client: JobSvcClient<Channel>,
    dataset_name: String,
    name: String,
    job_id: u64,
    length: u64,
    finished: bool,
}

impl JobClient {
    /// Connect to `endpoint` and create job `name` over the items of
    /// `dataset_name` selected by `filter`
    pub async fn create(
        endpoint: &str,
        dataset_name: &str,
        name: &str,
        filter: &JobFilter,
    ) -> Result<Self> {
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
        let mut client = JobSvcClient::new(channel);

        let resp = client
            .create_job(create_request(dataset_name, name, filter))
            .await
            .map_err(|s| LoaderError::from_status("CreateJob", s))?
            .into_inner();
        info!(
            "Job {} created on {}: id={} length={}",
            name, dataset_name, resp.job_id, resp.length
        );

        Ok(Self {
            client,
            dataset_name: dataset_name.into(),
            name: name.into(),
            job_id: resp.job_id,
            length: resp.length,
            finished: false,
        })
    }

    /// Next batch of values
    ///
    /// `EndOfStream` once the server reports the job exhausted, and on every
    /// call after that.
    pub async fn next(&mut self) -> Result<Vec<Value>> {
        if self.finished {
            return Err(LoaderError::EndOfStream);
        }
        let resp = match self
            .client
            .next(NextRequest {
                job_id: self.job_id,
            })
            .await
        {
            Ok(resp) => resp.into_inner(),
            Err(status) => {
                let e = LoaderError::from_status("Next", status);
                if e.is_exhausted() {
                    debug!("Job {} exhausted", self.job_id);
                    self.finished = true;
                    return Err(LoaderError::EndOfStream);
                }
                return Err(e);
            }
        };
        resp.data.into_iter().map(Value::try_from).collect()
    }

    /// Delete the job on the server
    pub async fn delete(mut self) -> Result<()> {
        self.client
            .delete_job(DeleteJobRequest {
                name: self.name.clone(),
                dataset_name: self.dataset_name.clone(),
            })
            .await
            .map_err(|s| LoaderError::from_status("DeleteJob", s))?;
        info!("Deleted job {}", self.job_id);
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn job_id(&self) -> u64 {
        self.job_id
    }
}
