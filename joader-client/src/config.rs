//! Loader configuration
//!
//! Built explicitly and handed to the fetch worker at spawn; nothing is read
//! from ambient state unless the caller asks for `from_env`.

use std::time::Duration;

use crate::error::{LoaderError, Result};
use crate::{
    DEFAULT_DATA_QUEUE_CAPACITY, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SHUTDOWN_GRACE_SECS,
};

/// Retry policy for worker RPCs
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// No retries: the first failure is final
    pub fn fail_fast() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Configuration for one loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Dataset to read
    pub dataset_name: String,
    /// Loader name; hosts sharing a loader use the same name
    pub name: String,
    /// Server address, e.g. `http://127.0.0.1:4321`
    pub server_addr: String,
    /// Number of hosts the dataset is partitioned across
    pub nums: u32,
    /// `Next` batch size; -1 returns whatever is ready
    pub batch_size: i32,
    /// Data queue capacity
    pub queue_capacity: usize,
    /// Sleep between `Next` calls that returned nothing
    pub poll_interval: Duration,
    /// Bound on waiting for the worker's handshake
    pub handshake_timeout: Duration,
    /// Bound on waiting for the worker to stop before force-terminating it
    pub shutdown_grace: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Worker RPC retry policy
    pub retry: RetryPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            dataset_name: String::new(),
            name: String::new(),
            server_addr: "http://127.0.0.1:4321".into(),
            nums: 1,
            batch_size: -1,
            queue_capacity: DEFAULT_DATA_QUEUE_CAPACITY,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl LoaderConfig {
    /// Config for loader `name` over `dataset_name` served at `server_addr`
    pub fn new(
        dataset_name: impl Into<String>,
        name: impl Into<String>,
        server_addr: impl Into<String>,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            name: name.into(),
            server_addr: normalize_endpoint(&server_addr.into()),
            ..Default::default()
        }
    }

    pub fn with_nums(mut self, nums: u32) -> Self {
        self.nums = nums;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Load configuration from environment variables
    ///
    /// `JOADER_SERVER_ADDR`, `JOADER_DATASET`, `JOADER_LOADER_NAME`,
    /// `JOADER_NUMS`, `JOADER_BATCH_SIZE`, `JOADER_HANDSHAKE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            std::env::var("JOADER_DATASET").unwrap_or_default(),
            std::env::var("JOADER_LOADER_NAME").unwrap_or_else(|_| "loader".into()),
            std::env::var("JOADER_SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:4321".into()),
        );
        if let Some(nums) = parse_env("JOADER_NUMS")? {
            config.nums = nums;
        }
        if let Some(batch_size) = parse_env("JOADER_BATCH_SIZE")? {
            config.batch_size = batch_size;
        }
        if let Some(secs) = parse_env("JOADER_HANDSHAKE_TIMEOUT_SECS")? {
            config.handshake_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a loader
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(LoaderError::InvalidConfig {
                reason: reason.into(),
            })
        };
        if self.dataset_name.is_empty() {
            return invalid("dataset name is empty");
        }
        if self.name.is_empty() {
            return invalid("loader name is empty");
        }
        if self.nums == 0 {
            return invalid("nums must be at least 1");
        }
        if self.batch_size == 0 || self.batch_size < -1 {
            return invalid("batch size must be positive or -1");
        }
        if self.queue_capacity == 0 {
            return invalid("queue capacity must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry policy needs at least one attempt");
        }
        Ok(())
    }
}

/// Add an `http://` scheme to bare `host:port` addresses
pub fn normalize_endpoint(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LoaderError::InvalidConfig {
                reason: format!("{key}={raw} is not a valid value"),
            }),
        Err(_) => Ok(None),
    }
}
