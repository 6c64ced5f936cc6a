//! Error types for the cascade and facade.

use converge_model::ModelError;
use converge_storage::StoreError;
use thiserror::Error;

/// Result type for facade and cascade operations.
pub type ConvergeResult<T> = Result<T, ConvergeError>;

/// Errors that can occur while reading or writing through the cascade.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// The facade was constructed without any store.
    #[error("at least one store is required")]
    NoStores,

    /// A store call failed. Earlier tiers of a fan-out may already hold the
    /// new state; nothing is rolled back.
    #[error("store {store:?} failed: {source}")]
    Store {
        store: String,
        #[source]
        source: StoreError,
    },

    /// Merge configuration or a written value was rejected.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Application data could not be converted to or from plain fields.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Typed data did not serialize to a JSON object.
    #[error("record data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl ConvergeError {
    pub(crate) fn store(name: &str, source: StoreError) -> Self {
        Self::Store {
            store: name.to_string(),
            source,
        }
    }
}
