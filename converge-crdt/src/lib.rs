//! Merge engine for converge.
//!
//! This crate resolves concurrent versions of records written by
//! independent devices:
//!
//! - [`Field`] — one version of one field: value, timestamp, writer
//! - [`Record`] — named fields plus the reserved tombstone
//! - [`FieldMerger`] — resolves two versions of a field per its strategy
//! - [`DocumentMerger`] — merges whole records field by field
//!
//! Every merge in this crate satisfies the following properties:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! Custom merge functions are the exception: they converge only if the
//! supplied function itself is commutative.

mod document;
mod field;
mod merger;
mod record;

pub use document::DocumentMerger;
pub use field::Field;
pub use merger::{FieldMerger, canonical_set};
pub use record::Record;
