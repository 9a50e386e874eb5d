//! # Background Persistence
//!
//! Queues never block on storage. Each mutation serializes the queue row
//! under the queue lock and hands it to this worker, which writes it later
//! on the blocking pool.
//!
//! ```text
//! queue ──submit(row)──→ [unbounded channel] ──→ worker task
//!                                                  │ coalesce per client
//!                                                  ↓
//!                                      spawn_blocking(store.store)
//! ```
//!
//! Accepted durability gap: a row submitted but not yet written when power
//! is lost is gone. A failed write is logged and kept; it is retried with the
//! next batch unless a newer row for the same client supersedes it.

use crate::domain::{PersistedRecord, StoreError};
use crate::ports::outbound::ExceptionQueueStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

type Reply = oneshot::Sender<Result<(), StoreError>>;

enum PersistCommand {
    Write(PersistedRecord),
    Flush(Reply),
    Shutdown(Reply),
}

/// Cheap, cloneable sender side of the persistence worker.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistenceHandle {
    /// Queue a row for writing. Never blocks, never fails the caller.
    pub fn submit(&self, record: PersistedRecord) {
        let client_id = record.client_id;
        if self.tx.send(PersistCommand::Write(record)).is_err() {
            warn!(client_id, "Persistence worker stopped, queue row not saved");
        }
    }

    /// Wait until every row submitted before this call has been attempted.
    ///
    /// Returns the last write error if any row is still waiting for retry.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.request(PersistCommand::Flush).await
    }

    /// Flush, then stop the worker.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.request(PersistCommand::Shutdown).await
    }

    async fn request(&self, command: fn(Reply) -> PersistCommand) -> Result<(), StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .map_err(|_| StoreError::WorkerStopped)?;
        reply_rx.await.map_err(|_| StoreError::WorkerStopped)?
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Worker task writing queue rows to an `ExceptionQueueStore`.
pub struct PersistenceWorker {
    store: Arc<dyn ExceptionQueueStore>,
    rx: mpsc::UnboundedReceiver<PersistCommand>,
    /// Latest unwritten row per client.
    outstanding: BTreeMap<u8, PersistedRecord>,
    last_error: Option<StoreError>,
}

impl PersistenceWorker {
    /// Spawn the worker on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(store: Arc<dyn ExceptionQueueStore>) -> (PersistenceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self {
            store,
            rx,
            outstanding: BTreeMap::new(),
            last_error: None,
        };
        let join = tokio::spawn(worker.run());
        (PersistenceHandle { tx }, join)
    }

    async fn run(mut self) {
        debug!("Exception persistence worker started");

        while let Some(first) = self.rx.recv().await {
            let mut waiters = Vec::new();
            let mut stop = None;

            self.absorb(first, &mut waiters, &mut stop);
            while stop.is_none() {
                match self.rx.try_recv() {
                    Ok(command) => self.absorb(command, &mut waiters, &mut stop),
                    Err(_) => break,
                }
            }

            self.write_outstanding().await;

            let outcome = match &self.last_error {
                Some(e) if !self.outstanding.is_empty() => Err(e.clone()),
                _ => Ok(()),
            };
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
            if let Some(reply) = stop {
                let _ = reply.send(outcome);
                break;
            }
        }

        if !self.outstanding.is_empty() {
            error!(
                rows = self.outstanding.len(),
                "Exception persistence worker stopped with unsaved rows"
            );
        }
        debug!("Exception persistence worker stopped");
    }

    fn absorb(&mut self, command: PersistCommand, waiters: &mut Vec<Reply>, stop: &mut Option<Reply>) {
        match command {
            PersistCommand::Write(record) => {
                self.outstanding.insert(record.client_id, record);
            }
            PersistCommand::Flush(reply) => waiters.push(reply),
            PersistCommand::Shutdown(reply) => *stop = Some(reply),
        }
    }

    async fn write_outstanding(&mut self) {
        if self.outstanding.is_empty() {
            return;
        }

        let batch: Vec<PersistedRecord> = std::mem::take(&mut self.outstanding)
            .into_values()
            .collect();
        let store = Arc::clone(&self.store);

        let failures = tokio::task::spawn_blocking(move || {
            batch
                .into_iter()
                .filter_map(|record| match store.store(&record) {
                    Ok(()) => None,
                    Err(e) => Some((record, e)),
                })
                .collect::<Vec<_>>()
        })
        .await;

        match failures {
            Ok(failures) => {
                self.last_error = None;
                for (record, e) in failures {
                    warn!(
                        client_id = record.client_id,
                        error = %e,
                        "Failed to persist exception queue, will retry"
                    );
                    self.last_error = Some(e);
                    self.outstanding.insert(record.client_id, record);
                }
            }
            Err(e) => {
                error!(error = %e, "Exception persistence batch panicked, rows lost");
                self.last_error = Some(StoreError::IOError {
                    message: e.to_string(),
                });
            }
        }
    }
}
