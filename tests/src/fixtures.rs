//! Shared test fixtures.

use parking_lot::Mutex;
use sas_exceptions::{
    ExceptionCode, ExceptionPayload, ExceptionQueueStore, ExceptionService, InMemoryKVStore,
    KvExceptionQueueStore, PersistedRecord, StoreError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Service over a fresh in-memory store, with test logging installed.
pub fn memory_service() -> (ExceptionService, Arc<dyn ExceptionQueueStore>) {
    egm_telemetry::init_test_logging();
    let store: Arc<dyn ExceptionQueueStore> =
        Arc::new(KvExceptionQueueStore::new(InMemoryKVStore::new()));
    (ExceptionService::new(store.clone()), store)
}

/// Distinct normal exceptions: bill accepted events differing in argument.
pub fn bill(n: u8) -> ExceptionPayload {
    ExceptionPayload::new(ExceptionCode::BillAccepted, [n])
}

pub fn code(code: ExceptionCode) -> ExceptionPayload {
    ExceptionPayload::from_code(code)
}

/// Counter to hand to `on_ack`.
#[derive(Clone, Default)]
pub struct AckCounter(Arc<AtomicUsize>);

impl AckCounter {
    pub fn callback(&self) -> Box<dyn FnOnce() + Send + 'static> {
        let count = self.0.clone();
        Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Row store whose writes can be made to fail.
#[derive(Default)]
pub struct UnreliableStore {
    failing: AtomicBool,
    rows: Mutex<Vec<PersistedRecord>>,
}

impl UnreliableStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ExceptionQueueStore for UnreliableStore {
    fn load(&self, client_id: u8) -> Result<Option<PersistedRecord>, StoreError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|row| row.client_id == client_id)
            .cloned())
    }

    fn store(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::IOError {
                message: "nvram write timeout".to_string(),
            });
        }
        let mut rows = self.rows.lock();
        rows.retain(|row| row.client_id != record.client_id);
        rows.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let mut rows = self.rows.lock().clone();
        rows.sort_by_key(|row| row.client_id);
        Ok(rows)
    }
}
