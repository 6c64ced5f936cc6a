//! The public record API.
//!
//! Translates plain application data into stamped fields, runs it through
//! the [`StoreCascade`], and projects merged records back to plain data.

use converge_crdt::{Field, Record, canonical_set};
use converge_model::{MergeConfig, MergeStrategy, ModelError};
use converge_storage::RecordStore;
use converge_types::{Clock, SystemClock, Timestamp, WriterId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::locks::{KeyGuard, KeyLocks};
use crate::{ConvergeConfig, ConvergeError, ConvergeResult, StoreCascade};

/// Plain application data: field name to value.
pub type Data = Map<String, Value>;

/// One writer's handle onto a set of shared record stores.
///
/// # Example
///
/// ```
/// use converge_cascade::{Converge, ConvergeConfig};
/// use converge_model::MergeConfig;
/// use converge_storage::{MemoryStore, RecordStore};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new("memory"));
/// let merge = MergeConfig::builder().max("highScore").build().unwrap();
/// let db = Converge::new(ConvergeConfig::new("phone"), merge, vec![store]).unwrap();
///
/// let update = json!({"highScore": 10}).as_object().cloned().unwrap();
/// db.set("player:1", update).await.unwrap();
/// let data = db.get("player:1").await.unwrap().unwrap();
/// assert_eq!(data["highScore"], json!(10));
/// # });
/// ```
pub struct Converge {
    writer_id: WriterId,
    merge: Arc<MergeConfig>,
    cascade: StoreCascade,
    clock: Arc<dyn Clock>,
    last_stamp: AtomicU64,
    locks: Option<KeyLocks>,
}

impl Converge {
    /// Creates a facade reading the system clock.
    ///
    /// Fails with [`ConvergeError::NoStores`] when `stores` is empty.
    pub fn new(
        config: ConvergeConfig,
        merge: MergeConfig,
        stores: Vec<Arc<dyn RecordStore>>,
    ) -> ConvergeResult<Self> {
        Self::builder()
            .config(config)
            .merge_config(merge)
            .stores(stores)
            .build()
    }

    pub fn builder() -> ConvergeBuilder {
        ConvergeBuilder::default()
    }

    #[must_use]
    pub fn writer_id(&self) -> &WriterId {
        &self.writer_id
    }

    #[must_use]
    pub fn merge_config(&self) -> &MergeConfig {
        &self.merge
    }

    #[must_use]
    pub fn store_count(&self) -> usize {
        self.cascade.len()
    }

    /// Reads `key` across every tier.
    ///
    /// Returns `None` if no tier holds the key or the merged record is
    /// tombstoned. Either way the merged record is promoted into faster tiers
    /// that missed it.
    pub async fn get(&self, key: &str) -> ConvergeResult<Option<Data>> {
        let Some(record) = self.cascade.get(key).await? else {
            return Ok(None);
        };
        if record.is_deleted() {
            debug!(key, "record is tombstoned");
            return Ok(None);
        }
        Ok(Some(record.project()))
    }

    /// Like [`get`](Self::get), deserialized into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> ConvergeResult<Option<T>> {
        match self.get(key).await? {
            Some(data) => Ok(Some(serde_json::from_value(Value::Object(data))?)),
            None => Ok(None),
        }
    }

    /// Writes a partial update from this writer.
    ///
    /// Every field in `update` is stamped with the current time and this
    /// writer's id, the tombstone is cleared at the same time, and the
    /// result is merged with every tier before being written to all of them.
    pub async fn set(&self, key: &str, update: Data) -> ConvergeResult<()> {
        let now = self.stamp();
        let mut record = Record::new();
        for (name, value) in update {
            self.merge.check_value(&name, &value)?;
            let field = match self.merge.strategy(&name) {
                MergeStrategy::GrowOnlyCounter => {
                    let amount = value.as_u64().ok_or_else(|| ModelError::InvalidValue {
                        field: name.clone(),
                        reason: format!("counter contribution must be a non-negative integer, got {value}"),
                    })?;
                    Field::counter(amount, now, self.writer_id.clone())
                }
                MergeStrategy::SetUnion => {
                    Field::new(canonical_set(&value), now, self.writer_id.clone())
                }
                _ => Field::new(value, now, self.writer_id.clone()),
            };
            record.fields.insert(name, field);
        }
        record.tombstone = Some(Field::tombstone(false, now, self.writer_id.clone()));

        let _guard = self.write_guard(key).await;
        let written = self.cascade.write(key, record).await?;
        debug!(key, fields = written.len(), "record written");
        Ok(())
    }

    /// Like [`set`](Self::set), taking any value that serializes to a JSON
    /// object.
    pub async fn set_from<T: Serialize>(&self, key: &str, update: &T) -> ConvergeResult<()> {
        match serde_json::to_value(update)? {
            Value::Object(data) => self.set(key, data).await,
            other => Err(ConvergeError::NotAnObject(json_type(&other))),
        }
    }

    /// Soft-deletes `key` by setting its tombstone, keeping every other
    /// field so a later write can revive it.
    ///
    /// Returns false without writing if no tier holds the key.
    pub async fn delete(&self, key: &str) -> ConvergeResult<bool> {
        let _guard = self.write_guard(key).await;
        let Some(read) = self.cascade.read_merged(key).await? else {
            return Ok(false);
        };
        let mut record = read.record;
        record.tombstone = Some(Field::tombstone(true, self.stamp(), self.writer_id.clone()));
        self.cascade.write_all(key, &record).await?;
        debug!(key, "record tombstoned");
        Ok(true)
    }

    /// Physically removes `key` from every tier, bypassing merge.
    ///
    /// No tombstone is left behind, so another writer that still holds the
    /// record can recreate it.
    pub async fn hard_delete(&self, key: &str) -> ConvergeResult<bool> {
        let removed = self.cascade.delete_all(key).await?;
        info!(key, removed, "hard delete");
        Ok(removed)
    }

    /// True if the first tier holding `key` has it live.
    pub async fn has(&self, key: &str) -> ConvergeResult<bool> {
        Ok(self
            .cascade
            .first_hit(key)
            .await?
            .is_some_and(|record| !record.is_deleted()))
    }

    /// True if the first tier holding `key` has it tombstoned.
    pub async fn is_deleted(&self, key: &str) -> ConvergeResult<bool> {
        Ok(self
            .cascade
            .first_hit(key)
            .await?
            .is_some_and(|record| record.is_deleted()))
    }

    /// The merged internal record for `key`, tombstoned or not.
    pub async fn get_raw(&self, key: &str) -> ConvergeResult<Option<Record>> {
        Ok(self.cascade.read_merged(key).await?.map(|read| read.record))
    }

    /// Clears every tier that supports clearing.
    pub async fn clear(&self) -> ConvergeResult<()> {
        let cleared = self.cascade.clear().await?;
        info!(cleared, tiers = self.cascade.len(), "cleared stores");
        Ok(())
    }

    /// Next write timestamp: the clock reading, bumped past the last one
    /// this instance issued so its own writes never tie with each other.
    fn stamp(&self) -> Timestamp {
        let now = self.clock.now().as_millis();
        let next = |last: u64| now.max(last.saturating_add(1));
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
            .unwrap_or_else(|last| last);
        Timestamp::from_millis(next(previous))
    }

    async fn write_guard(&self, key: &str) -> Option<KeyGuard<'_>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(key).await),
            None => None,
        }
    }
}

impl std::fmt::Debug for Converge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converge")
            .field("writer_id", &self.writer_id)
            .field("cascade", &self.cascade)
            .field("serialize_writes", &self.locks.is_some())
            .finish()
    }
}

/// Builder for [`Converge`].
pub struct ConvergeBuilder {
    config: ConvergeConfig,
    merge: MergeConfig,
    stores: Vec<Arc<dyn RecordStore>>,
    clock: Arc<dyn Clock>,
}

impl Default for ConvergeBuilder {
    fn default() -> Self {
        Self {
            config: ConvergeConfig::default(),
            merge: MergeConfig::default(),
            stores: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl ConvergeBuilder {
    #[must_use]
    pub fn config(mut self, config: ConvergeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn writer_id(mut self, writer_id: impl Into<WriterId>) -> Self {
        self.config.writer_id = writer_id.into();
        self
    }

    #[must_use]
    pub fn serialize_writes(mut self, enabled: bool) -> Self {
        self.config.serialize_writes = enabled;
        self
    }

    #[must_use]
    pub fn merge_config(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    /// Appends a tier behind the ones already added.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.stores.push(store);
        self
    }

    #[must_use]
    pub fn stores(mut self, stores: Vec<Arc<dyn RecordStore>>) -> Self {
        self.stores.extend(stores);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> ConvergeResult<Converge> {
        let merge = Arc::new(self.merge);
        let cascade = StoreCascade::new(self.stores, Arc::clone(&merge))?;
        debug!(
            writer = %self.config.writer_id,
            tiers = cascade.len(),
            fields = merge.len(),
            "converge ready"
        );
        Ok(Converge {
            writer_id: self.config.writer_id,
            merge,
            cascade,
            clock: self.clock,
            last_stamp: AtomicU64::new(0),
            locks: self.config.serialize_writes.then(KeyLocks::new),
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
