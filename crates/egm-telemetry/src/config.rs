//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Logging configuration for one firmware service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name reported when logging starts
    pub service_name: String,

    /// `EnvFilter` directives (e.g. `info,sas_exceptions=debug`)
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "egm".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

fn flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1"
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `EGM_SERVICE_NAME`: Service name (default: egm)
    /// - `EGM_LOG_LEVEL` or `RUST_LOG`: Filter directives (default: info)
    /// - `EGM_CONSOLE_OUTPUT`: Enable stdout output (default: true)
    /// - `EGM_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: lookup("EGM_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("EGM_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("EGM_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("EGM_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Suffix the service name with a firmware component, e.g.
    /// `egm-sas-exceptions`.
    #[must_use]
    pub fn with_component(mut self, component: &str) -> Self {
        self.service_name = format!("{}-{}", self.service_name, component);
        self
    }
}
