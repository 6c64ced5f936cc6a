//! A single version of a single field.

use converge_types::{FieldMeta, Timestamp, WriterId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One field version as stored in every tier.
///
/// `contributions` is present only on grow-only-counter fields and maps each
/// writer to its latest absolute contribution; `value` then holds their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub value: Value,
    pub timestamp: Timestamp,
    pub writer_id: WriterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<BTreeMap<WriterId, u64>>,
}

impl Field {
    /// Creates a plain field version.
    #[must_use]
    pub fn new(value: Value, timestamp: Timestamp, writer_id: WriterId) -> Self {
        Self {
            value,
            timestamp,
            writer_id,
            contributions: None,
        }
    }

    /// Creates a counter field version seeded with this writer's absolute
    /// contribution.
    #[must_use]
    pub fn counter(amount: u64, timestamp: Timestamp, writer_id: WriterId) -> Self {
        let mut contributions = BTreeMap::new();
        contributions.insert(writer_id.clone(), amount);
        Self {
            value: Value::from(amount),
            timestamp,
            writer_id,
            contributions: Some(contributions),
        }
    }

    /// Creates a tombstone version.
    #[must_use]
    pub fn tombstone(deleted: bool, timestamp: Timestamp, writer_id: WriterId) -> Self {
        Self::new(Value::Bool(deleted), timestamp, writer_id)
    }

    /// Version order key: timestamp, then writer id.
    pub(crate) fn version(&self) -> (Timestamp, &WriterId) {
        (self.timestamp, &self.writer_id)
    }

    /// Returns the version metadata.
    #[must_use]
    pub fn meta(&self) -> FieldMeta {
        FieldMeta::new(self.timestamp, self.writer_id.clone())
    }

    /// Per-writer contributions, falling back to attributing the whole value
    /// to the field's writer when the map is missing.
    #[must_use]
    pub fn contributions_or_value(&self) -> BTreeMap<WriterId, u64> {
        match &self.contributions {
            Some(map) => map.clone(),
            None => {
                let mut map = BTreeMap::new();
                map.insert(self.writer_id.clone(), self.value.as_u64().unwrap_or(0));
                map
            }
        }
    }

    /// The externally visible value: the contribution sum for counters,
    /// the stored value otherwise.
    #[must_use]
    pub fn visible_value(&self) -> Value {
        match &self.contributions {
            Some(map) => Value::from(sum(map)),
            None => self.value.clone(),
        }
    }
}

pub(crate) fn sum(map: &BTreeMap<WriterId, u64>) -> u64 {
    map.values().fold(0u64, |acc, v| acc.saturating_add(*v))
}
