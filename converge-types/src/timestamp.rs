//! Wall-clock timestamps.
//!
//! Field versions are ordered by the writer's local wall clock in
//! milliseconds. There is no logical component: two devices whose clocks
//! disagree can invert the intended order of their writes. Equal timestamps
//! are broken by [`WriterId`] ordering, never by arrival order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::WriterId;

/// Milliseconds since the Unix epoch, as read on the writing device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The current wall-clock time.
    ///
    /// A clock set before the Unix epoch reads as zero.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    /// Creates a timestamp from raw milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the raw milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Version metadata of one side of a field merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub timestamp: Timestamp,
    pub writer_id: WriterId,
}

impl FieldMeta {
    #[must_use]
    pub fn new(timestamp: Timestamp, writer_id: WriterId) -> Self {
        Self {
            timestamp,
            writer_id,
        }
    }
}
