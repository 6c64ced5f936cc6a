#![allow(dead_code)]

use async_trait::async_trait;
use converge_cascade::{Converge, Data};
use converge_crdt::Record;
use converge_model::MergeConfig;
use converge_storage::{MemoryStore, RecordStore, StoreError, StoreResult};
use converge_types::ManualClock;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn data(value: Value) -> Data {
    value.as_object().cloned().expect("test data must be an object")
}

pub fn dyn_stores(stores: &[Arc<MemoryStore>]) -> Vec<Arc<dyn RecordStore>> {
    stores
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn RecordStore>)
        .collect()
}

pub fn writer(
    id: &str,
    merge: MergeConfig,
    stores: &[Arc<MemoryStore>],
    clock: &Arc<ManualClock>,
) -> Converge {
    Converge::builder()
        .writer_id(id)
        .merge_config(merge)
        .stores(dyn_stores(stores))
        .clock(Arc::clone(clock) as Arc<dyn converge_types::Clock>)
        .build()
        .unwrap()
}

pub fn game_config() -> MergeConfig {
    MergeConfig::builder()
        .lww("name")
        .max("highScore")
        .counter("totalCoins")
        .union("achievements")
        .build()
        .unwrap()
}

/// A store wrapper that counts calls and can be told to fail writes.
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_writes: AtomicBool,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl FlakyStore {
    pub fn new(name: &str) -> Self {
        Self {
            inner: MemoryStore::new(name),
            fail_writes: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Record>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, record: &Record) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.set(key, record).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key).await
    }
}
