//! Records: the unit stored under a key in every tier.
//!
//! A record serializes as one flat JSON object mapping field names to
//! [`Field`] versions, with the tombstone under the reserved `_deleted` key.
//! This shape is shared by every replica, so it must stay stable.

use converge_model::TOMBSTONE_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::Field;

/// A stored record: application fields plus the tombstone.
///
/// A field is present only if some writer has set it. Setting the tombstone
/// leaves every other field in place so a later write can revive the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_deleted", default, skip_serializing_if = "Option::is_none")]
    pub tombstone: Option<Field>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Field>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        if name == TOMBSTONE_FIELD {
            return self.tombstone.as_ref();
        }
        self.fields.get(name)
    }

    /// Inserts a field version, replacing any existing one without merging.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        let name = name.into();
        if name == TOMBSTONE_FIELD {
            self.tombstone = Some(field);
        } else {
            self.fields.insert(name, field);
        }
    }

    /// Returns true if the tombstone is set.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.tombstone
            .as_ref()
            .and_then(|f| f.value.as_bool())
            .unwrap_or(false)
    }

    /// Number of application fields (tombstone excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tombstone.is_none()
    }

    /// Projects the record to plain application data.
    ///
    /// Counter fields read as the sum of their contributions; every other
    /// field reads as its stored value. The tombstone is not included.
    #[must_use]
    pub fn project(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.visible_value()))
            .collect()
    }
}
