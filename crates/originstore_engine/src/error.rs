//! Error types for the engine contract.

use crate::engine::Version;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by a storage engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The named bucket does not exist.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// Name of the bucket.
        name: String,
    },

    /// An open requested a version below the stored version.
    #[error("version mismatch: requested {requested}, stored {stored}")]
    VersionMismatch {
        /// Version requested by the open.
        requested: Version,
        /// Version currently stored.
        stored: Version,
    },

    /// Bucket creation collided with an existing bucket.
    #[error("bucket already exists: {name}")]
    BucketExists {
        /// Name of the bucket.
        name: String,
    },

    /// A write request was issued in a read-only transaction.
    #[error("write request in read-only transaction on bucket {bucket}")]
    ReadOnly {
        /// Bucket the transaction is scoped to.
        bucket: String,
    },

    /// The connection has been closed.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The transaction aborted; no further requests are accepted.
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Reason for abort.
        reason: String,
    },

    /// The upgrade hook failed; the version transition was rolled back.
    #[error("upgrade failed: {message}")]
    UpgradeFailed {
        /// Description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a bucket-not-found error.
    pub fn bucket_not_found(name: impl Into<String>) -> Self {
        Self::BucketNotFound { name: name.into() }
    }

    /// Creates a bucket-exists error.
    pub fn bucket_exists(name: impl Into<String>) -> Self {
        Self::BucketExists { name: name.into() }
    }

    /// Creates a transaction-aborted error.
    pub fn transaction_aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Creates an upgrade-failed error.
    pub fn upgrade_failed(message: impl Into<String>) -> Self {
        Self::UpgradeFailed {
            message: message.into(),
        }
    }
}
