//! Error types for the joader client
//!
//! One taxonomy covering the control plane (RPC, handshake, shutdown)
//! and the shared-memory data plane (bounds, header protocol).

use std::time::Duration;
use thiserror::Error;

/// Primary error type for all loader operations
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    // ========== Connection Errors ==========

    /// Server unreachable
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Fetch worker never answered the start-up handshake
    #[error("Handshake with fetch worker timed out after {timeout:?}")]
    HandshakeTimeout { timeout: Duration },

    /// RPC returned a non-success status
    #[error("RPC {method} failed ({code:?}): {message}")]
    Rpc {
        method: &'static str,
        code: tonic::Code,
        message: String,
    },

    // ========== Stream Errors ==========

    /// Sentinel popped from the data queue
    #[error("End of stream")]
    EndOfStream,

    /// Fetch worker aborted the stream
    #[error("Fetch worker failed: {reason}")]
    WorkerFailed { reason: String },

    /// Worker did not exit within the grace period and was force-terminated
    #[error("Fetch worker did not stop within {grace:?}, force-terminated")]
    ShutdownTimeout { grace: Duration },

    // ========== Shared Memory Errors ==========

    /// Segment could not be opened or mapped
    #[error("Shared memory {path}: {reason}")]
    Shm { path: String, reason: String },

    /// Access beyond the mapped region
    #[error("Out of bounds: offset {offset} + len {len} exceeds region of {region_len} bytes")]
    OutOfBounds {
        offset: u64,
        len: u64,
        region_len: usize,
    },

    /// Malformed header or queue values
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    // ========== Config Errors ==========

    /// Invalid configuration value
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
}

impl LoaderError {
    /// Build a protocol error
    pub fn protocol(reason: impl Into<String>) -> Self {
        LoaderError::Protocol {
            reason: reason.into(),
        }
    }

    /// Map a tonic status from `method` into the taxonomy
    pub fn from_status(method: &'static str, status: tonic::Status) -> Self {
        LoaderError::Rpc {
            method,
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    /// Returns true if the call that produced this error may be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            LoaderError::ConnectionFailed { .. } => true,
            LoaderError::Rpc { code, .. } => matches!(
                code,
                tonic::Code::Unavailable
                    | tonic::Code::DeadlineExceeded
                    | tonic::Code::ResourceExhausted
                    | tonic::Code::Aborted
                    | tonic::Code::Unknown
            ),
            _ => false,
        }
    }

    /// Returns true if the server reported that the loader has no more data
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            LoaderError::Rpc {
                code: tonic::Code::OutOfRange,
                ..
            }
        )
    }

    /// Returns true if this error terminates the stream
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, LoaderError::EndOfStream)
    }
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let unavailable = LoaderError::from_status("Next", tonic::Status::unavailable("down"));
        assert!(unavailable.is_retryable());

        let not_found = LoaderError::from_status("Next", tonic::Status::not_found("loader 3"));
        assert!(!not_found.is_retryable());

        assert!(!LoaderError::EndOfStream.is_retryable());
        assert!(!LoaderError::protocol("bad tag").is_retryable());
    }

    #[test]
    fn test_exhausted_status() {
        let used_up = LoaderError::from_status("Next", tonic::Status::out_of_range("data has used up"));
        assert!(used_up.is_exhausted());
        assert!(!used_up.is_retryable());
    }
}
