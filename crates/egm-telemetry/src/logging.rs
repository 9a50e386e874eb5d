//! Subscriber setup and logging helper macros.
//!
//! Log lines from the exception subsystem carry consistent fields so a log
//! shipper can index them:
//! - `component`: firmware component (`sas-exceptions`, `sas-poll`, ...)
//! - `client_id`: SAS host client the event concerns
//! - `code`: exception code, rendered as `Name(0xNN)`

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Parse `EnvFilter` directives.
pub fn build_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::Filter {
        directives: directives.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Fails with `TelemetryError::Init` if a global subscriber is already set,
/// so a second call is harmless.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(&config.log_level)?;

    let output = config.console_output.then(|| {
        if config.json_logs {
            // JSON output for log shipping
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        filter = %config.log_level,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Route logs through the test harness's captured output.
///
/// Uses `RUST_LOG` if set, `debug` otherwise. Safe to call from every test.
pub fn init_test_logging() {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    let filter = build_filter(&directives).unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// Log an event about one exception code for one host client.
///
/// ```rust,ignore
/// log_exception_event!(info, "sas-poll", "Exception sent", client_id, code, attempt = 2);
/// ```
#[macro_export]
macro_rules! log_exception_event {
    ($level:ident, $component:expr, $msg:expr, $client_id:expr, $code:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = $component,
            client_id = $client_id,
            code = %$code,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a host-client lifecycle event.
#[macro_export]
macro_rules! log_client_event {
    ($level:ident, $component:expr, $msg:expr, $client_id:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = $component,
            client_id = $client_id,
            $($($field)*,)?
            $msg
        )
    };
}
