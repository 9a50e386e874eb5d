//! # Exception Queue State Machine
//!
//! Pure per-client queue state: a bounded FIFO of normal exceptions, a
//! bitmask of latched priority exceptions, and at most one outstanding read.
//!
//! ```text
//!                 get_next()                 get_next()
//!   [IDLE] ─────────────────→ [PENDING] ──────────────┐
//!     ↑  peek()                   │   ↑               │
//!     └──┘                        │   └───────────────┘
//!     ↑      acknowledge()        │   (previous read is forgotten)
//!     └───────────────────────────┤
//!     ↑      clear_pending()      │
//!     └───────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - FIFO length never exceeds `MAX_NORMAL_EXCEPTIONS`
//! - A code in the `PriorityTable` never enters the FIFO
//! - Priority bits record presence only
//! - At most one pending read, always the last item `get_next()` returned

use super::codes::ExceptionCode;
use super::config::{JurisdictionOptions, OverflowPolicy, MAX_NORMAL_EXCEPTIONS};
use super::errors::ExceptionError;
use super::payload::ExceptionPayload;
use super::persistence::{decode_fifo, encode_fifo, PersistedRecord};
use super::priority::{canonical_slot, PriorityFlags, PriorityTable};
use std::collections::VecDeque;

/// The item last handed out by `get_next()` and awaiting acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingRead {
    /// The FIFO head at the time of the read.
    NormalHead(ExceptionPayload),
    /// A latched priority code.
    Priority(ExceptionCode),
}

impl PendingRead {
    pub fn code(&self) -> ExceptionCode {
        match self {
            Self::NormalHead(payload) => payload.code(),
            Self::Priority(code) => *code,
        }
    }
}

/// Result of admitting an exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Priority bit set (`newly_set == false` when it was already latched).
    Latched { newly_set: bool },
    /// Appended to the FIFO.
    Queued,
    /// FIFO was full; the oldest entry was evicted to make room.
    EvictedOldest(ExceptionPayload),
    /// FIFO was full; the new exception was dropped.
    DroppedNewest,
}

impl EnqueueOutcome {
    pub fn overflowed(&self) -> bool {
        matches!(self, Self::EvictedOldest(_) | Self::DroppedNewest)
    }
}

/// In-memory state of one client's exception queue.
#[derive(Clone, Debug)]
pub struct ExceptionQueueState {
    table: PriorityTable,
    overflow_policy: OverflowPolicy,
    fifo: VecDeque<ExceptionPayload>,
    flags: PriorityFlags,
    pending: Option<PendingRead>,
}

impl ExceptionQueueState {
    /// Creates an empty queue for the given jurisdiction.
    pub fn new(options: &JurisdictionOptions) -> Self {
        Self {
            table: PriorityTable::new(options),
            overflow_policy: options.overflow_policy(),
            fifo: VecDeque::with_capacity(MAX_NORMAL_EXCEPTIONS),
            flags: PriorityFlags::default(),
            pending: None,
        }
    }

    /// Rebuilds state from a persisted row.
    ///
    /// The row may have been written under a different jurisdiction; it is
    /// normalized so the invariants hold for the current table.
    pub fn restore(
        options: &JurisdictionOptions,
        record: &PersistedRecord,
    ) -> Result<Self, ExceptionError> {
        let mut state = Self::new(options);
        let restored = decode_fifo(&record.queue_bytes)?;
        let stored_flags = PriorityFlags::from_bits(record.priority_flags);

        // Bits for codes still in the table keep their meaning.
        state.flags = state.table.mask(stored_flags);

        // Bits for codes demoted out of the table become FIFO entries.
        for code in super::priority::CANONICAL_PRIORITY_ORDER {
            if state.table.contains(code) {
                continue;
            }
            if let Some(slot) = canonical_slot(code) {
                if stored_flags.is_set(slot) {
                    state.push_normal(ExceptionPayload::from_code(code));
                }
            }
        }

        for payload in restored {
            state.admit(payload);
        }

        Ok(state)
    }

    /// Serializes the persistent part of the state.
    pub fn to_record(&self, client_id: u8) -> Result<PersistedRecord, ExceptionError> {
        Ok(PersistedRecord {
            client_id,
            queue_bytes: encode_fifo(&self.fifo)?,
            priority_flags: self.flags.bits(),
        })
    }

    pub fn table(&self) -> &PriorityTable {
        &self.table
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn fifo(&self) -> &VecDeque<ExceptionPayload> {
        &self.fifo
    }

    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// True if there is neither a queued nor a latched exception.
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty() && self.flags.is_empty()
    }

    pub fn flags(&self) -> PriorityFlags {
        self.flags
    }

    pub fn pending(&self) -> Option<&PendingRead> {
        self.pending.as_ref()
    }

    /// Admits an exception.
    ///
    /// Priority codes latch their bit; everything else, including codes the
    /// routing table does not know, goes through the bounded FIFO.
    pub fn enqueue(&mut self, payload: ExceptionPayload) -> EnqueueOutcome {
        self.admit(payload)
    }

    fn admit(&mut self, payload: ExceptionPayload) -> EnqueueOutcome {
        if let Some(slot) = self.table.slot(payload.code()) {
            return EnqueueOutcome::Latched {
                newly_set: self.flags.set(slot),
            };
        }
        self.push_normal(payload)
    }

    fn push_normal(&mut self, payload: ExceptionPayload) -> EnqueueOutcome {
        if self.fifo.len() < MAX_NORMAL_EXCEPTIONS {
            self.fifo.push_back(payload);
            return EnqueueOutcome::Queued;
        }

        self.latch_overflow();

        match self.overflow_policy {
            OverflowPolicy::DiscardOldest => {
                let evicted = self.fifo.pop_front();
                self.fifo.push_back(payload);
                match evicted {
                    Some(evicted) => EnqueueOutcome::EvictedOldest(evicted),
                    None => EnqueueOutcome::Queued,
                }
            }
            OverflowPolicy::DiscardNewest => EnqueueOutcome::DroppedNewest,
        }
    }

    fn latch_overflow(&mut self) {
        if let Some(slot) = canonical_slot(ExceptionCode::ExceptionBufferOverflow) {
            self.flags.set(slot);
        }
    }

    /// Returns what `get_next()` would return, without changing anything.
    pub fn peek(&self) -> ExceptionPayload {
        match self.select() {
            Some(PendingRead::Priority(code)) => ExceptionPayload::from_code(code),
            Some(PendingRead::NormalHead(payload)) => payload,
            None => ExceptionPayload::no_activity(),
        }
    }

    /// Hands out the next exception and records it as the pending read.
    ///
    /// Any earlier unacknowledged read is forgotten first.
    pub fn get_next(&mut self) -> ExceptionPayload {
        self.pending = None;
        let selected = self.select();
        let payload = match &selected {
            Some(PendingRead::Priority(code)) => ExceptionPayload::from_code(*code),
            Some(PendingRead::NormalHead(payload)) => payload.clone(),
            None => ExceptionPayload::no_activity(),
        };
        self.pending = selected;
        payload
    }

    fn select(&self) -> Option<PendingRead> {
        if let Some(code) = self.table.first_set(self.flags) {
            return Some(PendingRead::Priority(code));
        }
        self.fifo.front().cloned().map(PendingRead::NormalHead)
    }

    /// Finalizes the pending read.
    ///
    /// Returns the code that was removed, or `None` if nothing was pending or
    /// the pending item had already left the queue (retracted or evicted).
    pub fn acknowledge(&mut self) -> Option<ExceptionCode> {
        let pending = self.pending.take()?;

        match pending {
            PendingRead::Priority(code) => {
                let slot = canonical_slot(code)?;
                self.flags.clear(slot).then_some(code)
            }
            PendingRead::NormalHead(payload) => {
                if self.fifo.front() == Some(&payload) {
                    self.fifo.pop_front();
                    return Some(payload.code());
                }
                let index = self.fifo.iter().position(|p| *p == payload)?;
                self.fifo.remove(index).map(|p| p.code())
            }
        }
    }

    /// Discards the pending marker, leaving the item queued.
    pub fn clear_pending(&mut self) -> Option<PendingRead> {
        self.pending.take()
    }

    /// Withdraws an exception the host has not yet retrieved.
    ///
    /// Returns `true` if something was removed.
    pub fn retract(&mut self, payload: &ExceptionPayload) -> bool {
        if let Some(slot) = self.table.slot(payload.code()) {
            return self.flags.clear(slot);
        }

        match self.fifo.iter().position(|p| p == payload) {
            Some(index) => {
                self.fifo.remove(index);
                true
            }
            None => false,
        }
    }

    /// Latched priority codes in delivery order.
    pub fn latched_codes(&self) -> Vec<ExceptionCode> {
        self.table.set_codes(self.flags)
    }
}
