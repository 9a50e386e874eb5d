//! # EGM Exception Delivery Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Services, stores and payload helpers
//! └── integration/      # Producer → broker → queue → poll → storage flows
//!     ├── poll_cycle.rs
//!     ├── restart.rs
//!     ├── jurisdiction.rs
//!     └── multi_client.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p egm-tests
//! cargo test -p egm-tests integration::restart
//! RUST_LOG=sas_exceptions=trace cargo test -p egm-tests -- --nocapture
//! ```

pub mod fixtures;
pub mod integration;
