//! Whole-record merge.

use converge_model::{MergeConfig, TOMBSTONE_FIELD};
use std::collections::BTreeSet;

use crate::{FieldMerger, Record};

/// Merges records by merging each field in the union of their field names.
///
/// Because each field merge is commutative, associative and idempotent, so
/// is the record merge, and any number of records can be folded pairwise in
/// any order.
#[derive(Debug, Clone, Copy)]
pub struct DocumentMerger<'a> {
    fields: FieldMerger<'a>,
}

impl<'a> DocumentMerger<'a> {
    #[must_use]
    pub fn new(config: &'a MergeConfig) -> Self {
        Self {
            fields: FieldMerger::new(config),
        }
    }

    /// Merges two records into a new one.
    #[must_use]
    pub fn merge(&self, a: &Record, b: &Record) -> Record {
        let names: BTreeSet<&String> = a.fields.keys().chain(b.fields.keys()).collect();

        let mut merged = Record::new();
        for name in names {
            if let Some(field) = self.fields.merge(name, a.fields.get(name), b.fields.get(name)) {
                merged.fields.insert(name.clone(), field);
            }
        }
        merged.tombstone = self.fields.merge(
            TOMBSTONE_FIELD,
            a.tombstone.as_ref(),
            b.tombstone.as_ref(),
        );
        merged
    }

    /// Folds records left to right. Returns `None` for an empty input.
    pub fn merge_all<I>(&self, records: I) -> Option<Record>
    where
        I: IntoIterator<Item = Record>,
    {
        records
            .into_iter()
            .reduce(|acc, next| self.merge(&acc, &next))
    }
}
