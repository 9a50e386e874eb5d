//! # Priority Table
//!
//! Priority exceptions are latched in a bitmask instead of queued: asserting
//! one that is already set is a no-op, and they are always delivered ahead
//! of the normal FIFO, lowest rank first.
//!
//! Each canonical entry owns a fixed bit, independent of the rank the
//! jurisdiction assigns it, so a persisted bitmask keeps its meaning when
//! the ordering flag changes between sessions.

use super::codes::ExceptionCode;
use super::config::JurisdictionOptions;
use serde::{Deserialize, Serialize};

/// Canonical priority order. Index is the bit slot.
pub const CANONICAL_PRIORITY_ORDER: [ExceptionCode; 15] = [
    ExceptionCode::SystemValidationRequest,
    ExceptionCode::ValidationIdNotConfigured,
    ExceptionCode::CashOutTicketPrinted,
    ExceptionCode::HandpayValidated,
    ExceptionCode::HandpayIsPending,
    ExceptionCode::TicketHasBeenInserted,
    ExceptionCode::TicketTransferComplete,
    ExceptionCode::AftTransferComplete,
    ExceptionCode::AftRequestForHostCashout,
    ExceptionCode::AftRequestForHostToCashOutWin,
    ExceptionCode::AftRequestToRegister,
    ExceptionCode::AftRegistrationAcknowledged,
    ExceptionCode::AftRegistrationCancelled,
    ExceptionCode::GameLocked,
    ExceptionCode::ExceptionBufferOverflow,
];

/// Fixed bit slot of a code in the canonical table.
pub fn canonical_slot(code: ExceptionCode) -> Option<u32> {
    CANONICAL_PRIORITY_ORDER
        .iter()
        .position(|c| *c == code)
        .map(|slot| slot as u32)
}

/// Latched priority exceptions, one bit per canonical slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriorityFlags(i32);

impl PriorityFlags {
    pub fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> i32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_set(self, slot: u32) -> bool {
        self.0 & (1 << slot) != 0
    }

    /// Set a bit. Returns `false` if it was already set.
    pub fn set(&mut self, slot: u32) -> bool {
        let was_set = self.is_set(slot);
        self.0 |= 1 << slot;
        !was_set
    }

    /// Clear a bit. Returns `false` if it was not set.
    pub fn clear(&mut self, slot: u32) -> bool {
        let was_set = self.is_set(slot);
        self.0 &= !(1 << slot);
        was_set
    }
}

/// Per-queue ranking of priority codes, built once from jurisdiction options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriorityTable {
    /// Codes in delivery order (index = rank).
    ranked: Vec<ExceptionCode>,
}

impl PriorityTable {
    pub fn new(options: &JurisdictionOptions) -> Self {
        let mut ranked: Vec<ExceptionCode> = CANONICAL_PRIORITY_ORDER.to_vec();

        if options.legacy_handpay_ordering {
            let validated = ranked.iter().position(|c| *c == ExceptionCode::HandpayValidated);
            let pending = ranked.iter().position(|c| *c == ExceptionCode::HandpayIsPending);
            if let (Some(a), Some(b)) = (validated, pending) {
                ranked.swap(a, b);
            }
        }

        if options.none_validation {
            ranked.retain(|c| {
                !matches!(
                    c,
                    ExceptionCode::CashOutTicketPrinted | ExceptionCode::HandpayValidated
                )
            });
        }

        Self { ranked }
    }

    pub fn contains(&self, code: ExceptionCode) -> bool {
        self.ranked.contains(&code)
    }

    /// Delivery rank of a code; lower is delivered first.
    pub fn rank(&self, code: ExceptionCode) -> Option<usize> {
        self.ranked.iter().position(|c| *c == code)
    }

    /// Bit slot for a code, if it is a priority code in this table.
    pub fn slot(&self, code: ExceptionCode) -> Option<u32> {
        if self.contains(code) {
            canonical_slot(code)
        } else {
            None
        }
    }

    /// Codes in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = ExceptionCode> + '_ {
        self.ranked.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Highest-priority code whose bit is set.
    pub fn first_set(&self, flags: PriorityFlags) -> Option<ExceptionCode> {
        self.iter()
            .find(|code| canonical_slot(*code).is_some_and(|slot| flags.is_set(slot)))
    }

    /// Set codes in rank order.
    pub fn set_codes(&self, flags: PriorityFlags) -> Vec<ExceptionCode> {
        self.iter()
            .filter(|code| canonical_slot(*code).is_some_and(|slot| flags.is_set(slot)))
            .collect()
    }

    /// Drop bits that do not belong to a code in this table.
    pub fn mask(&self, flags: PriorityFlags) -> PriorityFlags {
        let allowed = self
            .iter()
            .filter_map(canonical_slot)
            .fold(0i32, |acc, slot| acc | (1 << slot));
        PriorityFlags::from_bits(flags.bits() & allowed)
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::new(&JurisdictionOptions::default())
    }
}
