//! # EGM Telemetry
//!
//! Structured logging for the EGM firmware services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use egm_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), egm_telemetry::TelemetryError> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EGM_SERVICE_NAME` | `egm` | Service name reported at startup |
//! | `EGM_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directives |
//! | `EGM_JSON_LOGS` | `false` | Emit JSON lines instead of pretty text |
//! | `EGM_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, init_test_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directives}': {message}")]
    Filter { directives: String, message: String },

    #[error("Failed to install global subscriber: {0}")]
    Init(String),
}

#[doc(hidden)]
pub use tracing;
