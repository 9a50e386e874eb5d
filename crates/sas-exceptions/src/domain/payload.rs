//! Exception payloads as handed to the poll responder.
//!
//! The payload is the wire image of one exception: the code byte followed by
//! whatever arguments its builder appended. This subsystem never looks past
//! the code byte.

use super::codes::ExceptionCode;
use super::errors::ExceptionError;
use std::hash::{Hash, Hasher};

/// Ordered byte sequence tagged with its exception code.
///
/// Equality and hashing are structural over the bytes.
#[derive(Clone, Debug)]
pub struct ExceptionPayload {
    code: ExceptionCode,
    bytes: Vec<u8>,
}

impl ExceptionPayload {
    /// Build a payload from a code and its encoded arguments.
    pub fn new(code: ExceptionCode, args: impl AsRef<[u8]>) -> Self {
        let args = args.as_ref();
        let mut bytes = Vec::with_capacity(1 + args.len());
        bytes.push(code.as_u8());
        bytes.extend_from_slice(args);
        Self { code, bytes }
    }

    /// Payload carrying only the code byte.
    pub fn from_code(code: ExceptionCode) -> Self {
        Self {
            code,
            bytes: vec![code.as_u8()],
        }
    }

    /// The "nothing pending" answer to a general poll.
    pub fn no_activity() -> Self {
        Self::from_code(ExceptionCode::NoActivity)
    }

    /// Parse a payload back from its wire image.
    ///
    /// # Errors
    /// - `EmptyPayload` if `bytes` is empty
    /// - `UnknownExceptionCode` if the first byte is not a known code
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExceptionError> {
        let first = *bytes.first().ok_or(ExceptionError::EmptyPayload)?;
        let code =
            ExceptionCode::from_u8(first).ok_or(ExceptionError::UnknownExceptionCode(first))?;
        Ok(Self { code, bytes })
    }

    pub fn code(&self) -> ExceptionCode {
        self.code
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Argument bytes following the code byte.
    pub fn args(&self) -> &[u8] {
        &self.bytes[1..]
    }

    pub fn is_no_activity(&self) -> bool {
        self.code == ExceptionCode::NoActivity
    }
}

impl PartialEq for ExceptionPayload {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ExceptionPayload {}

impl Hash for ExceptionPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl From<ExceptionCode> for ExceptionPayload {
    fn from(code: ExceptionCode) -> Self {
        Self::from_code(code)
    }
}
