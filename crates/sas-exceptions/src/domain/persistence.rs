//! # Persisted Queue Rows
//!
//! One row per host client. The FIFO is stored as a versioned bincode list
//! of payload wire images; the priority bitmask is stored as-is.
//!
//! Format of `queue_bytes`: \[VERSION\]\[bincode(Vec<Vec<u8>>)\]

use super::errors::ExceptionError;
use super::payload::ExceptionPayload;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Version tag leading every encoded FIFO.
const FIFO_FORMAT_VERSION: u8 = 1;

/// Storage row for one client's queue.
///
/// The pending read is transient and is not persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub client_id: u8,
    pub queue_bytes: Vec<u8>,
    pub priority_flags: i32,
}

impl PersistedRecord {
    /// Encode the record for a key-value row.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExceptionError> {
        bincode::serialize(self).map_err(|e| ExceptionError::Serialization(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ExceptionError> {
        bincode::deserialize(data).map_err(|e| ExceptionError::Serialization(e.to_string()))
    }
}

/// Encode FIFO contents, oldest first.
pub fn encode_fifo<'a>(
    fifo: impl IntoIterator<Item = &'a ExceptionPayload>,
) -> Result<Vec<u8>, ExceptionError> {
    let images: Vec<&[u8]> = fifo.into_iter().map(ExceptionPayload::as_bytes).collect();
    let body =
        bincode::serialize(&images).map_err(|e| ExceptionError::Serialization(e.to_string()))?;

    let mut buf = Vec::with_capacity(1 + body.len());
    buf.push(FIFO_FORMAT_VERSION);
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode FIFO contents, preserving order.
///
/// An empty buffer decodes to an empty FIFO.
pub fn decode_fifo(data: &[u8]) -> Result<VecDeque<ExceptionPayload>, ExceptionError> {
    let Some((version, body)) = data.split_first() else {
        return Ok(VecDeque::new());
    };

    if *version != FIFO_FORMAT_VERSION {
        return Err(ExceptionError::Serialization(format!(
            "unsupported queue format version {}",
            version
        )));
    }

    let images: Vec<Vec<u8>> =
        bincode::deserialize(body).map_err(|e| ExceptionError::Serialization(e.to_string()))?;

    images
        .into_iter()
        .map(ExceptionPayload::from_bytes)
        .collect()
}
