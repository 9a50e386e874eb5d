//! # Exception Broker
//!
//! Routes exceptions from protocol-event producers to every queue
//! subscribed to the code's delivery group, and keeps one-shot
//! acknowledgement callbacks keyed by code.
//!
//! ## Locking
//!
//! One mutex guards both tables and is held only to read or edit them.
//! Nothing foreign runs under it: subscriber snapshots are delivered after
//! it is released, and replaced or removed ack callbacks are dropped after
//! it is released, since dropping one may drop the last handle to a queue
//! whose `Drop` deregisters.
//!
//! Fan-out is serialized by a separate reentrant gate, so producers on
//! different threads cannot interleave per-queue order, while a provider or
//! sink that reports again from the delivering thread does not block.
//! Queues take their own lock inside `enqueue`/`retract`, giving the fixed
//! order gate → queue. A queue never enters the broker while holding its lock.
//!
//! The broker holds `Weak` references only; a dropped queue is pruned on the
//! next fan-out.

use crate::domain::{DeliveryGroup, ExceptionCode, ExceptionPayload};
use crate::ports::inbound::{AckCallback, ExceptionReporter, ExceptionSink};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

#[derive(Default)]
struct BrokerTables {
    subscribers: HashMap<DeliveryGroup, Vec<Weak<dyn ExceptionSink>>>,
    ack_handlers: HashMap<ExceptionCode, AckCallback>,
}

impl BrokerTables {
    /// Live subscribers of a group, pruning dead entries.
    fn live(&mut self, group: DeliveryGroup) -> Vec<Arc<dyn ExceptionSink>> {
        let Some(entries) = self.subscribers.get_mut(&group) else {
            return Vec::new();
        };
        entries.retain(|weak| weak.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Delivery counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Report calls received.
    pub reported: u64,
    /// Individual queue deliveries.
    pub delivered: u64,
    /// Report calls that reached no queue.
    pub dropped: u64,
}

/// Group-based exception router.
pub struct ExceptionBroker {
    tables: Mutex<BrokerTables>,
    fan_out_gate: ReentrantMutex<()>,
    reported: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl ExceptionBroker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(BrokerTables::default()),
            fan_out_gate: ReentrantMutex::new(()),
            reported: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Subscribe a queue to a group. Registering twice has no effect.
    pub fn register(&self, group: DeliveryGroup, sink: &Arc<dyn ExceptionSink>) {
        let mut tables = self.tables.lock();
        let entries = tables.subscribers.entry(group).or_default();

        let already = entries
            .iter()
            .any(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(sink)));
        if already {
            return;
        }

        entries.push(Arc::downgrade(sink));
        debug!(
            client_id = sink.client_id(),
            %group,
            subscribers = entries.len(),
            "Queue registered"
        );
    }

    /// Unsubscribe a queue from a group. No-op if it is not subscribed.
    ///
    /// Takes the sink by reference so a queue can deregister from `Drop`,
    /// when no strong reference to it exists anymore.
    pub fn deregister(&self, group: DeliveryGroup, sink: &dyn ExceptionSink) {
        let mut tables = self.tables.lock();
        let Some(entries) = tables.subscribers.get_mut(&group) else {
            return;
        };

        let before = entries.len();
        entries.retain(|weak| !std::ptr::addr_eq(weak.as_ptr(), sink));
        if entries.len() != before {
            debug!(client_id = sink.client_id(), %group, "Queue deregistered");
        }
    }

    /// Remove and return the callback for `code`.
    pub fn take_ack_handler(&self, code: ExceptionCode) -> Option<AckCallback> {
        self.tables.lock().ack_handlers.remove(&code)
    }

    pub fn has_ack_handler(&self, code: ExceptionCode) -> bool {
        self.tables.lock().ack_handlers.contains_key(&code)
    }

    /// Number of live queues subscribed to a group.
    pub fn subscriber_count(&self, group: DeliveryGroup) -> usize {
        self.tables
            .lock()
            .subscribers
            .get(&group)
            .map_or(0, |entries| {
                entries.iter().filter(|weak| weak.strong_count() > 0).count()
            })
    }

    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            reported: self.reported.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Run `deliver` for each live subscriber of the code's group.
    ///
    /// Returns the number of queues `deliver` accepted.
    fn fan_out<F>(&self, code: ExceptionCode, mut deliver: F) -> usize
    where
        F: FnMut(&dyn ExceptionSink) -> bool,
    {
        let Some(group) = code.delivery_group() else {
            trace!(%code, "No delivery group for code");
            return 0;
        };

        let _gate = self.fan_out_gate.lock();
        let targets = self.tables.lock().live(group);
        if targets.is_empty() {
            trace!(%code, %group, "No subscribers for group");
        }

        let mut reached = 0;
        for sink in &targets {
            if deliver(sink.as_ref()) {
                reached += 1;
            }
        }
        reached
    }

    fn record_report(&self, code: ExceptionCode, reached: usize) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        if reached == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(%code, "Exception not delivered to any queue");
        } else {
            self.delivered.fetch_add(reached as u64, Ordering::Relaxed);
        }
    }
}

impl Default for ExceptionBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionReporter for ExceptionBroker {
    fn report(&self, payload: ExceptionPayload) {
        let code = payload.code();
        let reached = self.fan_out(code, |sink| {
            sink.enqueue(payload.clone());
            true
        });
        self.record_report(code, reached);
    }

    fn report_to_client(&self, payload: ExceptionPayload, client_id: u8) {
        let code = payload.code();
        let reached = self.fan_out(code, |sink| {
            if sink.client_id() != client_id {
                return false;
            }
            sink.enqueue(payload.clone());
            true
        });
        self.record_report(code, reached);
    }

    fn report_with<F>(&self, code: ExceptionCode, provider: F)
    where
        F: Fn(u8) -> ExceptionPayload,
    {
        let reached = self.fan_out(code, |sink| {
            let client_id = sink.client_id();
            let payload = provider(client_id);
            if payload.code() != code {
                warn!(
                    client_id,
                    expected = %code,
                    actual = %payload.code(),
                    "Provider returned payload for a different code, skipped"
                );
                return false;
            }
            sink.enqueue(payload);
            true
        });
        self.record_report(code, reached);
    }

    fn retract(&self, payload: &ExceptionPayload) {
        let code = payload.code();
        let reached = self.fan_out(code, |sink| {
            sink.retract(payload);
            true
        });
        if reached > 0 {
            self.remove_on_ack(code);
            debug!(%code, queues = reached, "Exception retracted");
        }
    }

    fn retract_from_client(&self, payload: &ExceptionPayload, client_id: u8) {
        let code = payload.code();
        let reached = self.fan_out(code, |sink| {
            if sink.client_id() != client_id {
                return false;
            }
            sink.retract(payload);
            true
        });
        if reached > 0 {
            self.remove_on_ack(code);
            debug!(%code, client_id, "Exception retracted from client");
        }
    }

    fn on_ack(&self, code: ExceptionCode, callback: AckCallback) {
        let previous = self.tables.lock().ack_handlers.insert(code, callback);
        debug!(%code, replaced = previous.is_some(), "Ack handler registered");
        drop(previous);
    }

    fn remove_on_ack(&self, code: ExceptionCode) {
        let removed = self.tables.lock().ack_handlers.remove(&code);
        if removed.is_some() {
            trace!(%code, "Ack handler removed");
        }
    }
}
