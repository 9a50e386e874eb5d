//! # Inbound Ports
//!
//! | Trait | Caller | Implemented by |
//! |-------|--------|----------------|
//! | `ExceptionReporter` | protocol-event producers | `ExceptionBroker` |
//! | `ExceptionPollResponder` | long-poll dispatch loop | `PriorityExceptionQueue` |
//! | `ExceptionSink` | `ExceptionBroker` fan-out | `PriorityExceptionQueue` |

use crate::domain::{ExceptionCode, ExceptionPayload};

/// One-shot callback run when a host acknowledges a code.
pub type AckCallback = Box<dyn FnOnce() + Send + 'static>;

/// Producer-facing API for raising and withdrawing exceptions.
///
/// None of these fail: a code nobody subscribes to is dropped silently.
pub trait ExceptionReporter: Send + Sync {
    /// Deliver to every queue subscribed to the code's group.
    fn report(&self, payload: ExceptionPayload);

    /// Deliver only to the subscribed queue serving `client_id`.
    fn report_to_client(&self, payload: ExceptionPayload, client_id: u8);

    /// Deliver a client-specific payload built per subscribed queue.
    ///
    /// `provider` is called with each queue's client id; a payload whose code
    /// differs from `code` is not delivered to that queue.
    fn report_with<F>(&self, code: ExceptionCode, provider: F)
    where
        F: Fn(u8) -> ExceptionPayload,
        Self: Sized;

    /// Withdraw an exception not yet retrieved, from every subscribed queue.
    fn retract(&self, payload: &ExceptionPayload);

    /// Withdraw from the subscribed queue serving `client_id` only.
    fn retract_from_client(&self, payload: &ExceptionPayload, client_id: u8);

    /// Register a one-shot callback for the next acknowledgement of `code`.
    ///
    /// Replaces any callback already registered for that code.
    fn on_ack(&self, code: ExceptionCode, callback: AckCallback);

    fn remove_on_ack(&self, code: ExceptionCode);
}

/// Poll-side API mirroring the host's "send pending exception" /
/// "confirm receipt" handshake.
pub trait ExceptionPollResponder: Send + Sync {
    /// What `get_next()` would return, without side effects.
    fn peek(&self) -> ExceptionPayload;

    /// Hand out the next exception and mark it pending.
    fn get_next(&self) -> ExceptionPayload;

    /// Finalize the pending read.
    fn acknowledge(&self);

    /// Forget the pending read without removing the item.
    fn clear_pending(&self);
}

/// Queue side of the broker fan-out.
pub trait ExceptionSink: Send + Sync {
    fn client_id(&self) -> u8;

    fn enqueue(&self, payload: ExceptionPayload);

    /// Withdraw a payload. Must not call back into the broker.
    fn retract(&self, payload: &ExceptionPayload);
}
