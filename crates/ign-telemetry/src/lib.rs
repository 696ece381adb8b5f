//! # Ignition Telemetry
//!
//! Structured logging for the Ignition crates. Libraries only emit `tracing`
//! events; binaries and test suites call [`init_logging`] once.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ign_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // Deployment code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IGN_SERVICE_NAME` | `ignition` | Service name in logs |
//! | `IGN_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `IGN_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `IGN_JSON_LOGS` | `false` | JSON lines instead of pretty output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging, init_test_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("failed to install the subscriber: {0}")]
    AlreadyInitialized(String),
}
