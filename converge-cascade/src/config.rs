//! Facade configuration.

use converge_types::WriterId;
use serde::{Deserialize, Serialize};

/// Settings for one writer's [`Converge`](crate::Converge) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergeConfig {
    /// Identity stamped on every field this instance writes.
    pub writer_id: WriterId,
    /// Serialize `set` and `delete` per key inside this process.
    ///
    /// Off by default: concurrent writes to one key from the same process can
    /// then lose updates unless the caller serializes them.
    #[serde(default)]
    pub serialize_writes: bool,
}

impl ConvergeConfig {
    #[must_use]
    pub fn new(writer_id: impl Into<WriterId>) -> Self {
        Self {
            writer_id: writer_id.into(),
            serialize_writes: false,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self {
            writer_id: WriterId::new(),
            serialize_writes: false,
        }
    }
}
