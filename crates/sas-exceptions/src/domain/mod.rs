//! # Domain Layer - Exception Delivery
//!
//! Pure state and configuration; no I/O, no locking.
//!
//! ## Components
//!
//! - `codes`: `ExceptionCode`, `DeliveryGroup`, code→group routing table
//! - `payload`: `ExceptionPayload` wire image
//! - `priority`: `PriorityTable`, `PriorityFlags`
//! - `state`: `ExceptionQueueState` peek/get-next/acknowledge state machine
//! - `persistence`: `PersistedRecord` row and FIFO codec
//! - `config`: per-client jurisdiction and subscription settings
//! - `errors`: `ExceptionError`, `StoreError`

pub mod codes;
pub mod config;
pub mod errors;
pub mod payload;
pub mod persistence;
pub mod priority;
pub mod state;

pub use codes::*;
pub use config::*;
pub use errors::*;
pub use payload::*;
pub use persistence::*;
pub use priority::*;
pub use state::*;
