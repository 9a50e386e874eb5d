//! # Service Layer
//!
//! - `broker`: `ExceptionBroker`, the group-based router
//! - `queue`: `PriorityExceptionQueue`, one per host client
//!
//! `ExceptionService` wires both to a store and the persistence worker.

pub mod broker;
pub mod queue;

pub use broker::{BrokerStats, ExceptionBroker};
pub use queue::{ExceptionQueueSnapshot, PriorityExceptionQueue};

use crate::adapters::{PersistenceHandle, PersistenceWorker};
use crate::domain::{ExceptionError, ExceptionQueueConfig};
use crate::ports::outbound::ExceptionQueueStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::info;

/// Owns the broker, the row store and the persistence worker for one EGM.
pub struct ExceptionService {
    broker: Arc<ExceptionBroker>,
    store: Arc<dyn ExceptionQueueStore>,
    persister: PersistenceHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
    clients: Mutex<HashMap<u8, Weak<PriorityExceptionQueue>>>,
}

impl ExceptionService {
    /// Start the service. Must be called within a Tokio runtime.
    pub fn new(store: Arc<dyn ExceptionQueueStore>) -> Self {
        let (persister, worker) = PersistenceWorker::spawn(Arc::clone(&store));
        Self {
            broker: Arc::new(ExceptionBroker::new()),
            store,
            persister,
            worker: Mutex::new(Some(worker)),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Producer-facing router.
    pub fn broker(&self) -> &Arc<ExceptionBroker> {
        &self.broker
    }

    pub fn store(&self) -> &Arc<dyn ExceptionQueueStore> {
        &self.store
    }

    pub fn persister(&self) -> &PersistenceHandle {
        &self.persister
    }

    /// Create, restore and subscribe the queue for a host client session.
    ///
    /// # Errors
    /// - `InvalidClient` / `InvalidConfig` for a bad config or a client that
    ///   already has a live queue
    /// - `Storage` if the persisted row cannot be read
    pub fn attach_client(
        &self,
        config: ExceptionQueueConfig,
    ) -> Result<Arc<PriorityExceptionQueue>, ExceptionError> {
        let client_id = config.client_id;
        let mut clients = self.clients.lock();

        if let Some(existing) = clients.get(&client_id).and_then(Weak::upgrade) {
            if !existing.is_disposed() {
                return Err(ExceptionError::InvalidConfig(format!(
                    "client {client_id} already has an exception queue"
                )));
            }
        }

        let queue = PriorityExceptionQueue::new(
            config,
            Arc::clone(&self.broker),
            self.store.as_ref(),
            self.persister.clone(),
        )?;
        clients.insert(client_id, Arc::downgrade(&queue));
        Ok(queue)
    }

    /// The live queue serving `client_id`, if attached.
    pub fn client(&self, client_id: u8) -> Option<Arc<PriorityExceptionQueue>> {
        self.clients
            .lock()
            .get(&client_id)
            .and_then(Weak::upgrade)
            .filter(|queue| !queue.is_disposed())
    }

    /// Wait for every queued row to be written.
    pub async fn flush(&self) -> Result<(), ExceptionError> {
        Ok(self.persister.flush().await?)
    }

    /// Flush and stop the persistence worker.
    pub async fn shutdown(&self) -> Result<(), ExceptionError> {
        let result = self.persister.shutdown().await;
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
        info!(stats = ?self.broker.stats(), "Exception service stopped");
        Ok(result?)
    }
}
