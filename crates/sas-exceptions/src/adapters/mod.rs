//! Adapters (outer layer).
//!
//! - `storage`: `KeyValueStore` implementations
//! - `queue_store`: per-client row store over a `KeyValueStore`
//! - `persister`: background persistence worker

pub mod persister;
pub mod queue_store;
pub mod storage;

pub use persister::{PersistenceHandle, PersistenceWorker};
pub use queue_store::KvExceptionQueueStore;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
