//! Per-field conflict resolution.
//!
//! Given the two versions of a field that two replicas hold, pick or build
//! the version both should converge to.
//!
//! Last-write-wins selects a whole version. Every other strategy builds a
//! new value from both sides and stamps it with the metadata of the more
//! recently touched side; that writer is not necessarily the one whose value
//! survived.

use converge_model::{MergeConfig, MergeStrategy, TOMBSTONE_FIELD};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::Field;
use crate::field::sum;

/// Resolves two versions of one field according to a [`MergeConfig`].
#[derive(Debug, Clone, Copy)]
pub struct FieldMerger<'a> {
    config: &'a MergeConfig,
}

impl<'a> FieldMerger<'a> {
    #[must_use]
    pub fn new(config: &'a MergeConfig) -> Self {
        Self { config }
    }

    /// Merges the `local` and `remote` versions of field `key`.
    ///
    /// A missing side is the identity: the other side is returned unchanged.
    /// The tombstone field always merges last-write-wins.
    #[must_use]
    pub fn merge(&self, key: &str, local: Option<&Field>, remote: Option<&Field>) -> Option<Field> {
        match (local, remote) {
            (None, None) => None,
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (Some(local), Some(remote)) => {
                if key == TOMBSTONE_FIELD {
                    return Some(last_write_wins(local, remote).clone());
                }
                Some(resolve(self.config.strategy(key), local, remote))
            }
        }
    }
}

fn resolve(strategy: &MergeStrategy, local: &Field, remote: &Field) -> Field {
    match strategy {
        MergeStrategy::LastWriteWins => last_write_wins(local, remote).clone(),
        MergeStrategy::Maximum => stamped(local, remote, pick_numeric(local, remote, Ordering::Greater)),
        MergeStrategy::Minimum => stamped(local, remote, pick_numeric(local, remote, Ordering::Less)),
        MergeStrategy::GrowOnlyCounter => {
            let mut merged: BTreeMap<_, u64> = local.contributions_or_value();
            for (writer, amount) in remote.contributions_or_value() {
                let entry = merged.entry(writer).or_insert(0);
                *entry = (*entry).max(amount);
            }
            let mut field = stamped(local, remote, Value::from(sum(&merged)));
            field.contributions = Some(merged);
            field
        }
        MergeStrategy::SetUnion => stamped(local, remote, union(&local.value, &remote.value)),
        MergeStrategy::Custom(f) => {
            let value = f(&local.value, &remote.value, &local.meta(), &remote.meta());
            stamped(local, remote, value)
        }
    }
}

/// Orders two versions by timestamp, then writer id, then value text.
fn version_order(a: &Field, b: &Field) -> Ordering {
    a.version()
        .cmp(&b.version())
        .then_with(|| a.value.to_string().cmp(&b.value.to_string()))
}

fn last_write_wins<'f>(a: &'f Field, b: &'f Field) -> &'f Field {
    if version_order(a, b) == Ordering::Less { b } else { a }
}

/// Builds a field carrying `value` and the metadata of the newer input.
fn stamped(a: &Field, b: &Field, value: Value) -> Field {
    let newer = if a.version() >= b.version() { a } else { b };
    Field::new(value, newer.timestamp, newer.writer_id.clone())
}

/// Picks the value that compares as `want` numerically. Equal or
/// non-numeric values fall back to the last-write-wins choice.
///
/// The fallback is only associative while every version holds a number.
/// Local writes are kind-checked, but a foreign replica can still store a
/// non-number in a max/min field, and then fold order can change the result.
fn pick_numeric(a: &Field, b: &Field, want: Ordering) -> Value {
    match compare_numbers(&a.value, &b.value) {
        Some(ord) if ord == want => a.value.clone(),
        Some(ord) if ord == want.reverse() => b.value.clone(),
        _ => last_write_wins(a, b).value.clone(),
    }
}

/// Compares two JSON numbers, exactly for integers and as `f64` once
/// either side is a float.
fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (as_integer(a), as_integer(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn as_integer(v: &Value) -> Option<i128> {
    v.as_i64()
        .map(i128::from)
        .or_else(|| v.as_u64().map(i128::from))
}

/// Rewrites a collection into the canonical form set-union merges produce:
/// deduplicated and ordered by the JSON text of each element.
///
/// Writers store set-union values in this form so that merging a version
/// with itself is a no-op.
#[must_use]
pub fn canonical_set(value: &Value) -> Value {
    union(value, &Value::Null)
}

/// Deduplicated union in canonical order. Non-array inputs count as
/// one-element collections.
fn union(a: &Value, b: &Value) -> Value {
    let mut items: BTreeMap<String, Value> = BTreeMap::new();
    for side in [a, b] {
        match side {
            Value::Array(values) => {
                for v in values {
                    items.entry(v.to_string()).or_insert_with(|| v.clone());
                }
            }
            Value::Null => {}
            other => {
                items.entry(other.to_string()).or_insert_with(|| other.clone());
            }
        }
    }
    Value::Array(items.into_values().collect())
}
