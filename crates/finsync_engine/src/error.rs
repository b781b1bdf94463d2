//! Error types for the sync engine.

use finsync_model::{EntityKind, ModelError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote ledger refused a single record.
    #[error("remote rejected {kind} record {id}: {reason}")]
    Rejected {
        /// Collection of the record.
        kind: EntityKind,
        /// Record id.
        id: String,
        /// Reason given by the remote.
        reason: String,
    },

    /// The remote ledger failed to serve a request.
    #[error("server error: {0}")]
    Server(String),

    /// Local entity store failure.
    #[error("local store error: {0}")]
    Store(String),

    /// Wire encoding or decoding failure.
    #[error("codec error: {0}")]
    Codec(#[from] ModelError),

    /// A remote call did not finish within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// The remote ledger is not reachable.
    #[error("not connected to remote ledger")]
    NotConnected,

    /// No user is signed in.
    #[error("no authenticated user")]
    NotAuthenticated,

    /// No async runtime was available to run the sync on.
    #[error("no async runtime available")]
    NoRuntime,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a local store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            SyncError::Server(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::transport_fatal("bad certificate").is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Server("unavailable".into()).is_retryable());
        assert!(!SyncError::NotAuthenticated.is_retryable());
        assert!(!SyncError::Rejected {
            kind: EntityKind::Budget,
            id: "b1".into(),
            reason: "too large".into(),
        }
        .is_retryable());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            SyncError::NotConnected.to_string(),
            "not connected to remote ledger"
        );

        let err = SyncError::Rejected {
            kind: EntityKind::LedgerEntry,
            id: "t1".into(),
            reason: "too large".into(),
        };
        assert_eq!(
            err.to_string(),
            "remote rejected transactions record t1: too large"
        );

        let err: SyncError = ModelError::MissingField("id").into();
        assert!(err.to_string().contains("missing field: id"));
    }
}
