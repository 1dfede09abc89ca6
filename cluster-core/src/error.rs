//! Error types for genuine (non-control-flow) failures.

use crate::types::NodeId;
use thiserror::Error;

/// Errors that can occur while running the cluster node runtime.
///
/// This is distinct from [`crate::control::ControlSignal`]: those three
/// variants are expected protocol signals driving reconvergence, while
/// `ClusterError` covers conditions that are genuinely exceptional —
/// transport setup failures, malformed configuration, and registry
/// precondition violations.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("peer {node_id} not found in the address list")]
    PeerNotFound { node_id: NodeId },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("registry precondition violated: {message}")]
    Registry { message: String },

    #[error("upstream parent unreachable: {message}")]
    ParentUnreachable { message: String },

    #[error("timeout: {operation}")]
    Timeout { operation: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type Result<T> = std::result::Result<T, ClusterError>;

impl ClusterError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    pub fn parent_unreachable(message: impl Into<String>) -> Self {
        Self::ParentUnreachable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the operation that produced this error might
    /// succeed. Transport/timeout conditions are transient; configuration
    /// and registry violations are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Whether this error is fatal and should terminate the process
    /// (registry preconditions per spec §7.4).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Registry { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        assert!(ClusterError::network("connection refused").is_retryable());
    }

    #[test]
    fn registry_errors_are_fatal_not_retryable() {
        let err = ClusterError::registry("parent path never appeared");
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }
}
