use converge_crdt::{Field, Record};
use converge_storage::{MemoryStore, RecordStore, StoreError};
use converge_types::{Timestamp, WriterId};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample() -> Record {
    let mut r = Record::new();
    r.insert("name", Field::new(json!("ann"), Timestamp::from_millis(1), WriterId::from("a")));
    r.insert("coins", Field::counter(5, Timestamp::from_millis(1), WriterId::from("a")));
    r
}

#[tokio::test]
async fn get_missing_is_none() {
    let store = MemoryStore::new("mem");
    assert_eq!(store.get("nope").await.unwrap(), None);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn set_then_get_returns_same_record() {
    let store = MemoryStore::new("mem");
    let record = sample();
    store.set("k", &record).await.unwrap();

    assert_eq!(store.get("k").await.unwrap(), Some(record));
    assert_eq!(store.len().await, 1);
    assert!(store.contains_key("k").await);
}

#[tokio::test]
async fn set_overwrites_without_merging() {
    let store = MemoryStore::new("mem");
    store.set("k", &sample()).await.unwrap();

    let mut other = Record::new();
    other.insert("x", Field::new(json!(1), Timestamp::from_millis(0), WriterId::from("b")));
    store.set("k", &other).await.unwrap();

    assert_eq!(store.get("k").await.unwrap(), Some(other));
}

#[tokio::test]
async fn stored_shape_is_flat_json() {
    let store = MemoryStore::new("mem");
    store.set("k", &sample()).await.unwrap();

    let raw = store.raw("k").await.unwrap();
    assert_eq!(raw["name"], json!({"value": "ann", "timestamp": 1, "writerId": "a"}));
    assert_eq!(raw["coins"]["contributions"], json!({"a": 5}));
}

#[tokio::test]
async fn delete_reports_presence() {
    let store = MemoryStore::new("mem");
    store.set("k", &sample()).await.unwrap();

    assert!(store.delete("k").await.unwrap());
    assert!(!store.delete("k").await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn clear_empties_store() {
    let store = MemoryStore::new("mem");
    store.set("a", &sample()).await.unwrap();
    store.set("b", &sample()).await.unwrap();

    assert!(store.supports_clear());
    store.clear().await.unwrap();
    assert!(store.is_empty().await);
}

struct ReadOnly;

#[async_trait::async_trait]
impl RecordStore for ReadOnly {
    fn name(&self) -> &str {
        "read-only"
    }

    async fn get(&self, _key: &str) -> converge_storage::StoreResult<Option<Record>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _record: &Record) -> converge_storage::StoreResult<()> {
        Err(StoreError::Backend("read-only".into()))
    }

    async fn delete(&self, _key: &str) -> converge_storage::StoreResult<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn clear_defaults_to_unsupported() {
    let store = ReadOnly;
    assert!(!store.supports_clear());
    assert!(matches!(store.clear().await, Err(StoreError::Unsupported("clear"))));
}
