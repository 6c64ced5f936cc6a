//! Reads and writes across an ordered list of store tiers.
//!
//! Tier 0 is the fastest cache; the last tier is the source of truth. Reads
//! query every tier and fold what they return through the document merger;
//! writes read every tier first so that versions committed by other writers
//! are folded in, then write the result to every tier.

use converge_crdt::{DocumentMerger, Record};
use converge_model::MergeConfig;
use converge_storage::RecordStore;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{ConvergeError, ConvergeResult};

/// The merged view of every tier for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeRead {
    /// All tier versions folded together.
    pub record: Record,
    /// Index of the first tier that held the key.
    pub hit: usize,
}

/// Orchestrates an ordered list of stores.
pub struct StoreCascade {
    stores: Vec<Arc<dyn RecordStore>>,
    config: Arc<MergeConfig>,
}

impl StoreCascade {
    /// Creates a cascade. Fails with [`ConvergeError::NoStores`] when
    /// `stores` is empty.
    pub fn new(stores: Vec<Arc<dyn RecordStore>>, config: Arc<MergeConfig>) -> ConvergeResult<Self> {
        if stores.is_empty() {
            return Err(ConvergeError::NoStores);
        }
        Ok(Self { stores, config })
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Queries every tier in order and merges whatever they hold.
    ///
    /// Does not write anything back.
    pub async fn read_merged(&self, key: &str) -> ConvergeResult<Option<CascadeRead>> {
        let merger = DocumentMerger::new(&self.config);
        let mut hit = None;
        let mut merged: Option<Record> = None;

        for (index, store) in self.stores.iter().enumerate() {
            let Some(record) = store
                .get(key)
                .await
                .map_err(|e| ConvergeError::store(store.name(), e))?
            else {
                debug!(store = store.name(), key, "tier miss");
                continue;
            };
            debug!(store = store.name(), key, tier = index, "tier hit");
            hit.get_or_insert(index);
            merged = Some(match merged {
                Some(acc) => merger.merge(&acc, &record),
                None => record,
            });
        }

        Ok(merged.zip(hit).map(|(record, hit)| CascadeRead { record, hit }))
    }

    /// Reads the merged record and promotes it into every tier in front of
    /// the first hit.
    ///
    /// Returns the record even when it is tombstoned; visibility is the
    /// caller's decision.
    pub async fn get(&self, key: &str) -> ConvergeResult<Option<Record>> {
        let Some(read) = self.read_merged(key).await? else {
            debug!(key, "miss on every tier");
            return Ok(None);
        };
        if read.hit > 0 {
            debug!(key, tiers = read.hit, "promoting into faster tiers");
            write_tiers(&self.stores[..read.hit], key, &read.record).await?;
        }
        Ok(Some(read.record))
    }

    /// Folds every tier's version of `key` into `update` and writes the
    /// result to every tier. Returns what was written.
    ///
    /// Tiers are read one after another; the write fan-out runs
    /// concurrently.
    pub async fn write(&self, key: &str, update: Record) -> ConvergeResult<Record> {
        let merger = DocumentMerger::new(&self.config);
        let mut merged = update;
        for store in &self.stores {
            if let Some(existing) = store
                .get(key)
                .await
                .map_err(|e| ConvergeError::store(store.name(), e))?
            {
                merged = merger.merge(&merged, &existing);
            }
        }
        self.write_all(key, &merged).await?;
        Ok(merged)
    }

    /// Writes `record` to every tier as-is.
    pub async fn write_all(&self, key: &str, record: &Record) -> ConvergeResult<()> {
        write_tiers(&self.stores, key, record).await
    }

    /// The record held by the first tier that has the key, unmerged.
    pub async fn first_hit(&self, key: &str) -> ConvergeResult<Option<Record>> {
        for store in &self.stores {
            if let Some(record) = store
                .get(key)
                .await
                .map_err(|e| ConvergeError::store(store.name(), e))?
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Physically removes `key` from every tier. Returns true if any tier
    /// held it.
    pub async fn delete_all(&self, key: &str) -> ConvergeResult<bool> {
        let deletes = self.stores.iter().map(|store| async move {
            store.delete(key).await.map_err(|e| {
                warn!(store = store.name(), key, error = %e, "tier delete failed");
                ConvergeError::store(store.name(), e)
            })
        });
        let removed = try_join_all(deletes).await?;
        Ok(removed.into_iter().any(|r| r))
    }

    /// Clears every tier that supports it. Returns how many were cleared.
    pub async fn clear(&self) -> ConvergeResult<usize> {
        let clears = self
            .stores
            .iter()
            .filter(|store| store.supports_clear())
            .map(|store| async move {
                store
                    .clear()
                    .await
                    .map_err(|e| ConvergeError::store(store.name(), e))
            });
        Ok(try_join_all(clears).await?.len())
    }
}

async fn write_tiers(
    stores: &[Arc<dyn RecordStore>],
    key: &str,
    record: &Record,
) -> ConvergeResult<()> {
    let writes = stores.iter().map(|store| async move {
        store.set(key, record).await.map_err(|e| {
            warn!(store = store.name(), key, error = %e, "tier write failed");
            ConvergeError::store(store.name(), e)
        })
    });
    try_join_all(writes).await?;
    Ok(())
}

impl std::fmt::Debug for StoreCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("StoreCascade")
            .field("stores", &names)
            .field("config", &self.config)
            .finish()
    }
}
