//! Merge configuration model for converge.
//!
//! Defines how each field of a record resolves concurrent versions:
//! - [`MergeStrategy`] — the six resolution rules (LWW, max, min, counter, union, custom)
//! - [`ValueKind`] — the shape of value a field is declared to hold
//! - [`FieldSpec`] — a strategy bound to a value kind
//! - [`MergeConfig`] — the explicit registry of named fields, validated on build
//!
//! Fields that are not declared in the registry merge last-write-wins and
//! accept any value.

mod config;
mod error;
mod schema;

pub use config::{MergeConfig, MergeConfigBuilder};
pub use error::{ModelError, ModelResult};
pub use schema::{FieldSpec, MergeFn, MergeStrategy, ValueKind};

/// Name of the reserved tombstone field in a stored record.
pub const TOMBSTONE_FIELD: &str = "_deleted";

/// Prefix reserved for engine-owned fields. Application fields may not use it.
pub const RESERVED_PREFIX: char = '_';
