//! # Inbox Telemetry
//!
//! Structured logging for the image inbox service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inbox_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `INBOX_SERVICE_NAME` | `image-inbox` | Service name attached to startup logs |
//! | `INBOX_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `INBOX_JSON_LOGS` | `true` in containers | Emit JSON lines instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },

    #[error("Failed to install global subscriber: {0}")]
    Subscriber(String),
}

/// Install the global `tracing` subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Keeps telemetry alive for the life of the process; logs on drop.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
