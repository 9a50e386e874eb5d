//! # Priority Exception Queue
//!
//! One instance per connected host client. Wraps `ExceptionQueueState` in a
//! mutex, persists every mutation through the background worker, and
//! bridges acknowledgements to the broker's one-shot callbacks.
//!
//! ## Lifecycle
//!
//! 1. `new()` validates the config, restores the client's row (if any) and
//!    registers with the broker for each subscribed group.
//! 2. The poll responder drives `peek`/`get_next`/`acknowledge`.
//! 3. `dispose()` (or `Drop`) deregisters. The persisted row survives.

use crate::adapters::PersistenceHandle;
use crate::domain::{
    DeliveryGroup, EnqueueOutcome, ExceptionCode, ExceptionError, ExceptionPayload,
    ExceptionQueueConfig, ExceptionQueueState, PendingRead, PriorityFlags, StoreError,
};
use crate::ports::inbound::{ExceptionPollResponder, ExceptionSink};
use crate::ports::outbound::ExceptionQueueStore;
use crate::service::broker::ExceptionBroker;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Point-in-time view of a queue for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionQueueSnapshot {
    pub client_id: u8,
    /// FIFO codes, oldest first.
    pub fifo: Vec<ExceptionCode>,
    /// Latched priority codes in delivery order.
    pub latched: Vec<ExceptionCode>,
    pub pending: Option<PendingRead>,
    pub priority_flags: i32,
}

/// Per-client exception queue.
pub struct PriorityExceptionQueue {
    client_id: u8,
    groups: Vec<DeliveryGroup>,
    state: Mutex<ExceptionQueueState>,
    broker: Arc<ExceptionBroker>,
    persister: PersistenceHandle,
    disposed: AtomicBool,
}

impl PriorityExceptionQueue {
    /// Build a queue, restore its persisted row and subscribe it.
    ///
    /// # Errors
    /// - `InvalidClient` if the config fails validation
    /// - `Storage` if the row cannot be read (a corrupt row is not an error;
    ///   the queue starts empty)
    pub fn new(
        config: ExceptionQueueConfig,
        broker: Arc<ExceptionBroker>,
        store: &dyn ExceptionQueueStore,
        persister: PersistenceHandle,
    ) -> Result<Arc<Self>, ExceptionError> {
        config.validate()?;
        let client_id = config.client_id;

        let (state, normalized) = Self::restore_state(&config, store)?;
        let queue = Arc::new(Self {
            client_id,
            groups: config.subscriptions.groups(),
            state: Mutex::new(state),
            broker,
            persister,
            disposed: AtomicBool::new(false),
        });

        if normalized {
            queue.persist(&queue.state.lock());
        }

        let sink: Arc<dyn ExceptionSink> = queue.clone();
        for group in &queue.groups {
            queue.broker.register(*group, &sink);
        }

        info!(
            client_id,
            groups = ?queue.groups,
            fifo_len = queue.len(),
            flags = queue.priority_flags().bits(),
            "Exception queue attached"
        );
        Ok(queue)
    }

    /// Returns the restored state and whether it differs from the stored row.
    fn restore_state(
        config: &ExceptionQueueConfig,
        store: &dyn ExceptionQueueStore,
    ) -> Result<(ExceptionQueueState, bool), ExceptionError> {
        let client_id = config.client_id;
        let empty = || ExceptionQueueState::new(&config.jurisdiction);

        let record = match store.load(client_id) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok((empty(), false)),
            Err(StoreError::Corrupt { message, .. }) => {
                warn!(client_id, error = %message, "Corrupt exception queue row, starting empty");
                return Ok((empty(), true));
            }
            Err(e) => return Err(e.into()),
        };

        match ExceptionQueueState::restore(&config.jurisdiction, &record) {
            Ok(state) => {
                let normalized = state.to_record(client_id).ok().as_ref() != Some(&record);
                debug!(
                    client_id,
                    fifo_len = state.len(),
                    flags = state.flags().bits(),
                    normalized,
                    "Exception queue restored"
                );
                Ok((state, normalized))
            }
            Err(e) => {
                warn!(client_id, error = %e, "Undecodable exception queue row, starting empty");
                Ok((empty(), true))
            }
        }
    }

    /// Hand the current state to the persistence worker. Called under the
    /// state lock so rows reach the worker in mutation order.
    fn persist(&self, state: &ExceptionQueueState) {
        match state.to_record(self.client_id) {
            Ok(record) => self.persister.submit(record),
            Err(e) => warn!(client_id = self.client_id, error = %e, "Failed to encode exception queue"),
        }
    }

    /// Deregister from every joined group. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for group in &self.groups {
            self.broker.deregister(*group, self);
        }
        debug!(client_id = self.client_id, "Exception queue disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn subscribed_groups(&self) -> &[DeliveryGroup] {
        &self.groups
    }

    /// Number of normal exceptions queued.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// True if nothing is queued or latched.
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    pub fn priority_flags(&self) -> PriorityFlags {
        self.state.lock().flags()
    }

    pub fn pending(&self) -> Option<PendingRead> {
        self.state.lock().pending().cloned()
    }

    pub fn snapshot(&self) -> ExceptionQueueSnapshot {
        let state = self.state.lock();
        ExceptionQueueSnapshot {
            client_id: self.client_id,
            fifo: state.fifo().iter().map(ExceptionPayload::code).collect(),
            latched: state.latched_codes(),
            pending: state.pending().cloned(),
            priority_flags: state.flags().bits(),
        }
    }
}

impl ExceptionSink for PriorityExceptionQueue {
    fn client_id(&self) -> u8 {
        self.client_id
    }

    fn enqueue(&self, payload: ExceptionPayload) {
        let code = payload.code();
        let mut state = self.state.lock();
        let outcome = state.enqueue(payload);

        match &outcome {
            EnqueueOutcome::Latched { newly_set } => {
                trace!(client_id = self.client_id, %code, newly_set, "Priority exception latched");
            }
            EnqueueOutcome::Queued => {
                trace!(client_id = self.client_id, %code, fifo_len = state.len(), "Exception queued");
            }
            EnqueueOutcome::EvictedOldest(evicted) => {
                warn!(
                    client_id = self.client_id,
                    %code,
                    evicted = %evicted.code(),
                    "Exception buffer overflow, oldest discarded"
                );
            }
            EnqueueOutcome::DroppedNewest => {
                warn!(
                    client_id = self.client_id,
                    %code,
                    "Exception buffer overflow, newest discarded"
                );
            }
        }

        self.persist(&state);
    }

    fn retract(&self, payload: &ExceptionPayload) {
        let mut state = self.state.lock();
        let removed = state.retract(payload);
        trace!(client_id = self.client_id, code = %payload.code(), removed, "Retract");
        self.persist(&state);
    }
}

impl ExceptionPollResponder for PriorityExceptionQueue {
    fn peek(&self) -> ExceptionPayload {
        self.state.lock().peek()
    }

    fn get_next(&self) -> ExceptionPayload {
        let payload = self.state.lock().get_next();
        trace!(client_id = self.client_id, code = %payload.code(), "Exception handed out");
        payload
    }

    fn acknowledge(&self) {
        let acknowledged = {
            let mut state = self.state.lock();
            let acknowledged = state.acknowledge();
            if acknowledged.is_some() {
                self.persist(&state);
            }
            acknowledged
        };

        let Some(code) = acknowledged else {
            return;
        };
        debug!(client_id = self.client_id, %code, "Exception acknowledged");

        // Queue lock released: the callback may report new exceptions.
        if let Some(callback) = self.broker.take_ack_handler(code) {
            callback();
        }
    }

    fn clear_pending(&self) {
        if let Some(pending) = self.state.lock().clear_pending() {
            trace!(client_id = self.client_id, code = %pending.code(), "Pending read cleared");
        }
    }
}

impl Drop for PriorityExceptionQueue {
    fn drop(&mut self) {
        self.dispose();
    }
}
