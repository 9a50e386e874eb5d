//! # Outbound Ports
//!
//! Storage the exception subsystem depends on.
//!
//! Production: `FileBackedKVStore` under `KvExceptionQueueStore`
//! Testing: `InMemoryKVStore`

use crate::domain::{PersistedRecord, StoreError};

/// `(key, value)` rows returned by `prefix_scan`, sorted by key.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Byte-oriented store backing the queue rows (NVRAM file, RAM in tests).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// Apply `operations` as one unit: on error the store is unchanged.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StoreError>;
}

/// One step of an `atomic_batch_write`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Row-level persistence contract: one record per host client.
///
/// `store` must be an atomic read-modify-write; concurrent writers for the
/// same client are serialized.
pub trait ExceptionQueueStore: Send + Sync {
    fn load(&self, client_id: u8) -> Result<Option<PersistedRecord>, StoreError>;

    /// Overwrite the client's row.
    fn store(&self, record: &PersistedRecord) -> Result<(), StoreError>;

    /// Every persisted row, ordered by client id.
    fn load_all(&self) -> Result<Vec<PersistedRecord>, StoreError>;
}
