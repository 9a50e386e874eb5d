//! Per-client queue rows over a `KeyValueStore`.
//!
//! Key layout: `QUEUE_KEY_PREFIX` followed by the client id byte.

use crate::domain::{PersistedRecord, StoreError};
use crate::ports::outbound::{BatchOperation, ExceptionQueueStore, KeyValueStore};
use parking_lot::Mutex;
use tracing::trace;

/// Key prefix for exception queue rows.
pub const QUEUE_KEY_PREFIX: &[u8] = b"sas:exception_queue:";

fn row_key(client_id: u8) -> Vec<u8> {
    let mut key = QUEUE_KEY_PREFIX.to_vec();
    key.push(client_id);
    key
}

/// `ExceptionQueueStore` backed by any key-value store.
///
/// The mutex makes every `store` a serializable read-modify-write.
pub struct KvExceptionQueueStore<S: KeyValueStore> {
    kv: Mutex<S>,
}

impl<S: KeyValueStore> KvExceptionQueueStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv: Mutex::new(kv) }
    }

    pub fn into_inner(self) -> S {
        self.kv.into_inner()
    }
}

fn decode(client_id: u8, bytes: &[u8]) -> Result<PersistedRecord, StoreError> {
    PersistedRecord::from_bytes(bytes).map_err(|e| StoreError::Corrupt {
        client_id,
        message: e.to_string(),
    })
}

fn encode(record: &PersistedRecord) -> Result<Vec<u8>, StoreError> {
    record.to_bytes().map_err(|e| StoreError::Corrupt {
        client_id: record.client_id,
        message: e.to_string(),
    })
}

impl<S: KeyValueStore> ExceptionQueueStore for KvExceptionQueueStore<S> {
    fn load(&self, client_id: u8) -> Result<Option<PersistedRecord>, StoreError> {
        let kv = self.kv.lock();
        kv.get(&row_key(client_id))?
            .map(|bytes| decode(client_id, &bytes))
            .transpose()
    }

    fn store(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let key = row_key(record.client_id);
        let value = encode(record)?;

        let mut kv = self.kv.lock();
        if kv.get(&key)?.as_deref() == Some(value.as_slice()) {
            trace!(client_id = record.client_id, "Queue row unchanged, skipping write");
            return Ok(());
        }
        kv.atomic_batch_write(vec![BatchOperation::put(key, value)])
    }

    fn load_all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let kv = self.kv.lock();
        kv.prefix_scan(QUEUE_KEY_PREFIX)?
            .into_iter()
            .filter_map(|(key, value)| {
                let client_id = *key.get(QUEUE_KEY_PREFIX.len())?;
                Some(decode(client_id, &value))
            })
            .collect()
    }
}
