//! Store contract for converge.
//!
//! A store is any key-value backend that can hold a [`Record`] under a key.
//! The merge engine talks to every tier through [`RecordStore`]; concrete
//! backends (disk, network databases, …) live with the application and only
//! need to satisfy this contract.
//!
//! [`MemoryStore`] is bundled as a cache tier and for tests.
//!
//! [`Record`]: converge_crdt::Record

mod error;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::RecordStore;
