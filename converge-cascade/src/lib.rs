//! Multi-tier record access with conflict-free merging.
//!
//! Places a merge layer in front of one or more key-value stores so that
//! independent writers can read and write the same record without losing
//! updates.
//!
//! # Architecture
//!
//! - **Cascade**: [`StoreCascade`] reads every tier, merges what they hold,
//!   promotes the result into faster tiers, and fans writes out to all tiers
//! - **Facade**: [`Converge`] is the public API (`get`, `set`, `delete`,
//!   `hard_delete`, `has`, `is_deleted`, `get_raw`, `clear`)
//!
//! ## Write path
//!
//! 1. **Stamp**: every updated field gets the current time and this writer's id
//! 2. **Revive**: the tombstone is cleared at the same time
//! 3. **Read all**: each tier's version is merged into the update
//! 4. **Write all**: the merged record is written to every tier
//!
//! Overlapping writes to one key from the same process can race between
//! steps 3 and 4. Enable [`ConvergeConfig::serialize_writes`] or serialize
//! them externally if that matters.
//!
//! Ordering relies on each writer's wall clock; skewed clocks can reorder
//! last-write-wins outcomes.

mod cascade;
mod config;
mod error;
mod facade;
mod locks;

pub use cascade::{CascadeRead, StoreCascade};
pub use config::ConvergeConfig;
pub use error::{ConvergeError, ConvergeResult};
pub use facade::{Converge, ConvergeBuilder, Data};
pub use locks::{KeyGuard, KeyLocks};
