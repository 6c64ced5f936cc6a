//! Error types for the merge model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building a merge configuration or checking a value
/// against it.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Field name is empty or uses the reserved prefix.
    #[error("invalid field name {0:?}")]
    InvalidFieldName(String),

    /// The same field was declared twice.
    #[error("field {0:?} declared more than once")]
    DuplicateField(String),

    /// Strategy cannot operate on the declared value kind.
    #[error("field {field:?}: strategy {strategy} cannot merge {kind} values")]
    IncompatibleKind {
        field: String,
        strategy: &'static str,
        kind: &'static str,
    },

    /// A value written to a declared field does not fit it.
    #[error("field {field:?}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Declarative config failed to parse.
    #[error("invalid merge config: {0}")]
    Serialization(#[from] serde_json::Error),
}
