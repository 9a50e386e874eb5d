//! Ports (hexagonal architecture).
//!
//! - `inbound`: driving ports used by protocol-event producers and the poll
//!   responder
//! - `outbound`: driven ports the subsystem needs from storage

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
