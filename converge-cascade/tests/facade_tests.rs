mod common;

use common::{data, game_config, writer};
use converge_cascade::{Converge, ConvergeConfig, ConvergeError};
use converge_model::{MergeConfig, ModelError, TOMBSTONE_FIELD};
use converge_storage::{MemoryStore, RecordStore};
use converge_types::{ManualClock, Timestamp, WriterId};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

fn one_store() -> Vec<Arc<MemoryStore>> {
    vec![Arc::new(MemoryStore::new("memory"))]
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn zero_stores_is_fatal() {
    let err = Converge::new(ConvergeConfig::new("a"), MergeConfig::new(), Vec::new()).unwrap_err();
    assert!(matches!(err, ConvergeError::NoStores));
}

#[test]
fn accessors() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("phone", game_config(), &stores, &clock);
    assert_eq!(db.writer_id(), &WriterId::from("phone"));
    assert_eq!(db.store_count(), 1);
    assert_eq!(db.merge_config().len(), 4);
}

// ── get / set ────────────────────────────────────────────────────

#[tokio::test]
async fn get_unknown_key_is_none() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);
    assert_eq!(db.get("missing").await.unwrap(), None);
    assert_eq!(db.get_raw("missing").await.unwrap(), None);
    assert!(!db.has("missing").await.unwrap());
    assert!(!db.is_deleted("missing").await.unwrap());
}

#[tokio::test]
async fn set_then_get_returns_plain_data() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1_000));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann", "highScore": 10, "free": {"x": 1}})))
        .await
        .unwrap();

    let got = db.get("p1").await.unwrap().unwrap();
    assert_eq!(got, data(json!({"name": "Ann", "highScore": 10, "free": {"x": 1}})));
    assert!(db.has("p1").await.unwrap());
}

#[tokio::test]
async fn set_stamps_fields_and_clears_tombstone() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1_234));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();

    let raw = db.get_raw("p1").await.unwrap().unwrap();
    let name = raw.get("name").unwrap();
    assert_eq!(name.timestamp, Timestamp::from_millis(1_234));
    assert_eq!(name.writer_id, WriterId::from("a"));
    let tomb = raw.get(TOMBSTONE_FIELD).unwrap();
    assert_eq!(tomb.value, json!(false));
    assert_eq!(tomb.timestamp, Timestamp::from_millis(1_234));
}

#[tokio::test]
async fn partial_updates_keep_other_fields() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann", "highScore": 5}))).await.unwrap();
    clock.advance(10);
    db.set("p1", data(json!({"name": "Annie"}))).await.unwrap();

    let got = db.get("p1").await.unwrap().unwrap();
    assert_eq!(got, data(json!({"name": "Annie", "highScore": 5})));
}

#[tokio::test]
async fn invalid_values_are_rejected_before_any_write() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    let err = db.set("p1", data(json!({"highScore": "lots"}))).await.unwrap_err();
    assert!(matches!(err, ConvergeError::Model(ModelError::InvalidValue { .. })));
    let err = db.set("p1", data(json!({"totalCoins": -5}))).await.unwrap_err();
    assert!(matches!(err, ConvergeError::Model(ModelError::InvalidValue { .. })));
    let err = db.set("p1", data(json!({"_deleted": true}))).await.unwrap_err();
    assert!(matches!(err, ConvergeError::Model(ModelError::InvalidFieldName(_))));

    assert!(stores[0].is_empty().await);
}

#[tokio::test]
async fn sequential_writes_in_one_millisecond_keep_the_latest() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(100));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "zed"}))).await.unwrap();
    db.set("p1", data(json!({"name": "amy"}))).await.unwrap();
    assert_eq!(db.get("p1").await.unwrap().unwrap()["name"], json!("amy"));

    let raw = db.get_raw("p1").await.unwrap().unwrap();
    assert_eq!(raw.get("name").unwrap().timestamp, Timestamp::from_millis(101));
}

#[tokio::test]
async fn delete_then_set_in_one_millisecond_revives() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(100));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    db.delete("p1").await.unwrap();
    assert_eq!(db.get("p1").await.unwrap(), None);
    db.set("p1", data(json!({"name": "Bo"}))).await.unwrap();
    assert_eq!(db.get("p1").await.unwrap().unwrap()["name"], json!("Bo"));
}

// ── Strategies end to end ────────────────────────────────────────

#[tokio::test]
async fn counter_resetting_same_value_does_not_inflate() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    for _ in 0..3 {
        db.set("p1", data(json!({"totalCoins": 100}))).await.unwrap();
        clock.advance(1);
    }
    let got = db.get("p1").await.unwrap().unwrap();
    assert_eq!(got["totalCoins"], json!(100));
}

#[tokio::test]
async fn counter_sums_two_writers() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let a = writer("a", game_config(), &stores, &clock);
    let b = writer("b", game_config(), &stores, &clock);

    a.set("p1", data(json!({"totalCoins": 100}))).await.unwrap();
    clock.advance(1);
    b.set("p1", data(json!({"totalCoins": 50}))).await.unwrap();

    assert_eq!(a.get("p1").await.unwrap().unwrap()["totalCoins"], json!(150));
    assert_eq!(b.get("p1").await.unwrap().unwrap()["totalCoins"], json!(150));
}

#[tokio::test]
async fn union_merges_across_writers() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let a = writer("a", game_config(), &stores, &clock);
    let b = writer("b", game_config(), &stores, &clock);

    a.set("p1", data(json!({"achievements": ["a", "b", "c"]}))).await.unwrap();
    b.set("p1", data(json!({"achievements": ["b", "c", "d", "e"]}))).await.unwrap();

    let expected = json!(["a", "b", "c", "d", "e"]);
    assert_eq!(a.get("p1").await.unwrap().unwrap()["achievements"], expected);
    assert_eq!(b.get("p1").await.unwrap().unwrap()["achievements"], expected);
}

#[tokio::test]
async fn mixed_strategies_converge_for_both_writers() {
    let phone_store = Arc::new(MemoryStore::new("phone-cache"));
    let laptop_store = Arc::new(MemoryStore::new("laptop-cache"));
    let shared = Arc::new(MemoryStore::new("cloud"));
    let clock = Arc::new(ManualClock::new(1_000));

    let phone = writer("phone", game_config(), &[phone_store, Arc::clone(&shared)], &clock);
    let laptop = writer("laptop", game_config(), &[laptop_store, Arc::clone(&shared)], &clock);

    phone
        .set(
            "player",
            data(json!({
                "name": "Ann",
                "highScore": 1200,
                "totalCoins": 100,
                "achievements": ["a", "b", "c"],
            })),
        )
        .await
        .unwrap();
    clock.advance(1_000);
    laptop
        .set(
            "player",
            data(json!({
                "name": "Annie",
                "highScore": 900,
                "totalCoins": 50,
                "achievements": ["b", "c", "d", "e"],
            })),
        )
        .await
        .unwrap();

    let expected = data(json!({
        "name": "Annie",
        "highScore": 1200,
        "totalCoins": 150,
        "achievements": ["a", "b", "c", "d", "e"],
    }));
    assert_eq!(phone.get("player").await.unwrap().unwrap(), expected);
    assert_eq!(laptop.get("player").await.unwrap().unwrap(), expected);
}

// ── delete / revive ──────────────────────────────────────────────

#[tokio::test]
async fn delete_hides_record_but_keeps_fields() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    clock.advance(1);
    assert!(db.delete("p1").await.unwrap());

    assert_eq!(db.get("p1").await.unwrap(), None);
    assert!(!db.has("p1").await.unwrap());
    assert!(db.is_deleted("p1").await.unwrap());

    let raw = db.get_raw("p1").await.unwrap().unwrap();
    assert!(raw.is_deleted());
    assert_eq!(raw.get("name").unwrap().value, json!("Ann"));
}

#[tokio::test]
async fn delete_unknown_key_is_noop() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    assert!(!db.delete("ghost").await.unwrap());
    assert!(stores[0].is_empty().await);
}

#[tokio::test]
async fn later_edit_revives_deleted_record() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let a = writer("a", game_config(), &stores, &clock);
    let b = writer("b", game_config(), &stores, &clock);

    a.set("p1", data(json!({"name": "Ann", "highScore": 3}))).await.unwrap();
    clock.set(10);
    a.delete("p1").await.unwrap();
    clock.set(20);
    b.set("p1", data(json!({"name": "Bea"}))).await.unwrap();

    let got = a.get("p1").await.unwrap().unwrap();
    assert_eq!(got, data(json!({"name": "Bea", "highScore": 3})));
    assert!(!a.is_deleted("p1").await.unwrap());
}

#[tokio::test]
async fn edit_older_than_delete_stays_hidden() {
    let clock = Arc::new(ManualClock::new(1));
    let editor_store = Arc::new(MemoryStore::new("editor"));
    let deleter_store = Arc::new(MemoryStore::new("deleter"));
    let editor = writer("editor", game_config(), &[Arc::clone(&editor_store)], &clock);
    let deleter = writer("deleter", game_config(), &[Arc::clone(&deleter_store)], &clock);

    editor.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    deleter.set("p1", data(json!({"name": "Ann"}))).await.unwrap();

    // The edit happens at t=20 offline, the delete at t=30 elsewhere.
    clock.set(20);
    editor.set("p1", data(json!({"name": "Edited"}))).await.unwrap();
    clock.set(30);
    deleter.delete("p1").await.unwrap();

    // Reconcile both replicas through a cascade over both stores.
    let both = writer("reader", game_config(), &[editor_store, deleter_store], &clock);
    assert_eq!(both.get("p1").await.unwrap(), None);
    let raw = both.get_raw("p1").await.unwrap().unwrap();
    assert!(raw.is_deleted());
    assert_eq!(raw.get("name").unwrap().value, json!("Edited"));
}

#[tokio::test]
async fn hard_delete_removes_everywhere() {
    let stores = vec![
        Arc::new(MemoryStore::new("cache")),
        Arc::new(MemoryStore::new("disk")),
    ];
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    assert!(db.hard_delete("p1").await.unwrap());

    assert_eq!(db.get("p1").await.unwrap(), None);
    assert_eq!(db.get_raw("p1").await.unwrap(), None);
    assert!(!db.is_deleted("p1").await.unwrap());
    for store in &stores {
        assert!(!store.contains_key("p1").await);
    }
    assert!(!db.hard_delete("p1").await.unwrap());
}

#[tokio::test]
async fn hard_deleted_key_can_be_recreated() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    db.hard_delete("p1").await.unwrap();
    db.set("p1", data(json!({"highScore": 1}))).await.unwrap();

    assert_eq!(db.get("p1").await.unwrap().unwrap(), data(json!({"highScore": 1})));
}

// ── clear ────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_empties_every_tier() {
    let stores = vec![
        Arc::new(MemoryStore::new("cache")),
        Arc::new(MemoryStore::new("disk")),
    ];
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    db.set("p1", data(json!({"name": "Ann"}))).await.unwrap();
    db.set("p2", data(json!({"name": "Bo"}))).await.unwrap();
    db.clear().await.unwrap();

    for store in &stores {
        assert!(store.is_empty().await);
    }
}

// ── Typed helpers ────────────────────────────────────────────────

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Player {
    name: String,
    high_score: u32,
}

#[tokio::test]
async fn typed_set_and_get() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    let player = Player {
        name: "Ann".into(),
        high_score: 7,
    };
    db.set_from("p1", &player).await.unwrap();
    assert_eq!(db.get_as::<Player>("p1").await.unwrap(), Some(player));
}

#[tokio::test]
async fn typed_set_rejects_non_objects() {
    let stores = one_store();
    let clock = Arc::new(ManualClock::new(1));
    let db = writer("a", game_config(), &stores, &clock);

    let err = db.set_from("p1", &vec![1, 2]).await.unwrap_err();
    assert!(matches!(err, ConvergeError::NotAnObject("array")));
}

#[tokio::test]
async fn shares_one_store_through_trait_objects() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new("m"));
    let db = Converge::new(ConvergeConfig::new("a"), MergeConfig::new(), vec![store]).unwrap();
    db.set("k", data(json!({"v": 1}))).await.unwrap();
    assert_eq!(db.get("k").await.unwrap().unwrap()["v"], json!(1));
}
