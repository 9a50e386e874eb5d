//! Error types for the exception subsystem.
//!
//! Poll-responder and producer operations never return these: a host poll
//! must always be answerable. They surface only from construction, config
//! loading and the storage adapters.

use thiserror::Error;

/// Errors raised by the exception subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExceptionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Client id {client_id} out of range (max {max})")]
    InvalidClient { client_id: u8, max: u8 },

    #[error("Unknown exception code byte: 0x{0:02X}")]
    UnknownExceptionCode(u8),

    #[error("Exception payload is empty")]
    EmptyPayload,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Errors from the persistence collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error: {message}")]
    IOError { message: String },

    #[error("Corrupt record for client {client_id}: {message}")]
    Corrupt { client_id: u8, message: String },

    #[error("Persistence worker is not running")]
    WorkerStopped,
}
