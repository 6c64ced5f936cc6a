//! Error types for store adapters.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store can raise. The engine propagates them unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// Stored bytes could not be turned into a record, or back.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store does not implement an optional operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}
