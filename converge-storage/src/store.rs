//! The abstract store interface.

use async_trait::async_trait;
use converge_crdt::Record;

use crate::{StoreError, StoreResult};

/// A key-value backend holding records.
///
/// Stores are ordered by the caller from fastest (cache) to slowest (source
/// of truth). A store never merges: it returns what it holds and overwrites
/// on `set`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns the record stored under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<Record>>;

    /// Stores `record` under `key`, replacing whatever was there.
    async fn set(&self, key: &str, record: &Record) -> StoreResult<()>;

    /// Physically removes `key`. Returns true if something was removed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Returns whether [`clear`](Self::clear) is implemented.
    fn supports_clear(&self) -> bool {
        false
    }

    /// Removes every key.
    async fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Unsupported("clear"))
    }
}
