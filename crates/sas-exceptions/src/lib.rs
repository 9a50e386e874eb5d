//! # SAS Exception Delivery
//!
//! Queues, prioritizes, persists and hands off machine-generated exceptions
//! for retrieval by a polling SAS host, one at a time.
//!
//! ## Purpose
//!
//! Protocol-event producers report exceptions to the `ExceptionBroker`, which
//! fans them out to every `PriorityExceptionQueue` subscribed to the code's
//! delivery group. The poll responder answers each general poll from the
//! queue and confirms receipt with an acknowledgement.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | At most 25 normal exceptions per client | `domain/state.rs` - `push_normal()` |
//! | Priority codes never enter the FIFO | `domain/state.rs` - `admit()` |
//! | Re-asserting a latched code is a no-op | `domain/priority.rs` - `PriorityFlags::set()` |
//! | Single outstanding read | `domain/state.rs` - `get_next()` |
//! | Lowest rank delivered first | `domain/priority.rs` - `PriorityTable::first_set()` |
//!
//! ## Poll Handshake
//!
//! ```text
//! [IDLE] ──get_next──→ [PENDING] ──acknowledge──→ [IDLE] (item removed, callback run)
//!                          │
//!                          ├── get_next ──→ [PENDING] (previous read forgotten)
//!                          └── clear_pending ──→ [IDLE] (item kept)
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/  - ExceptionBroker, PriorityExceptionQueue,           │
//! │              ExceptionService wiring                            │
//! │  adapters/ - KV stores, queue row store, persistence worker     │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - ExceptionReporter, ExceptionPollResponder, │
//! │                      ExceptionSink                              │
//! │  ports/outbound.rs - KeyValueStore, ExceptionQueueStore         │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/ - codes, payloads, priority table, queue state,       │
//! │            persisted rows, config, errors                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let service = ExceptionService::new(Arc::new(KvExceptionQueueStore::new(
//!     FileBackedKVStore::open("/nvram/exceptions.db")?,
//! )));
//! let queue = service.attach_client(ExceptionQueueConfigBuilder::new(0).aft(true).build()?)?;
//!
//! service.broker().report(ExceptionCode::SlotDoorOpened.into());
//! let answer = queue.get_next();
//! // ... host confirms ...
//! queue.acknowledge();
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::queue_store::QUEUE_KEY_PREFIX;
pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::*;
