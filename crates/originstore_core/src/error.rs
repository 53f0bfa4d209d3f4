//! Error types for the storage facade.

use originstore_engine::EngineError;
use thiserror::Error;

/// Result type for facade operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to facade callers.
///
/// Every failure rejects exactly the call that triggered it; nothing is
/// retried and nothing raises detached from its call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening or upgrading the shared database failed.
    #[error("connection error: {0}")]
    Connection(#[source] EngineError),

    /// A transaction as a whole failed, independent of any single request.
    #[error("transaction error: {0}")]
    Transaction(#[source] EngineError),

    /// An individual request failed while the transaction remained viable.
    #[error("request error: {0}")]
    Request(#[source] EngineError),
}

impl StoreError {
    /// Wraps an engine error from an open or upgrade.
    pub fn connection(err: EngineError) -> Self {
        Self::Connection(err)
    }

    /// Wraps an engine error from a transaction open or commit.
    pub fn transaction(err: EngineError) -> Self {
        Self::Transaction(err)
    }

    /// Wraps an engine error from an individual request.
    pub fn request(err: EngineError) -> Self {
        Self::Request(err)
    }
}
