//! Core type definitions for converge.
//!
//! This crate defines the small vocabulary shared by every layer of the
//! merge engine:
//! - Writer identifiers (one per device that writes records)
//! - Wall-clock timestamps and the clocks that produce them
//! - Field metadata handed to custom merge functions
//!
//! Record and field shapes live in `converge-crdt`; merge configuration
//! lives in `converge-model`.

mod clock;
mod ids;
mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::WriterId;
pub use timestamp::{FieldMeta, Timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid writer id: {0}")]
    InvalidWriterId(String),
}
