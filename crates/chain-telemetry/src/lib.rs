//! # Chain Telemetry
//!
//! Logging and metrics for the Smith-Chain node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chain_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_LOG_LEVEL` | `info` | Log level filter |
//! | `SC_JSON_LOGS` | `false` | JSON formatted output |
//! | `SC_CONSOLE_OUTPUT` | `true` | Install a fmt layer at all |
//! | `SC_NETWORK` | `testnet` | Network name |
//!
//! Metrics are only collected; `gather_metrics` renders them as Prometheus
//! text for whoever embeds the runtime.

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, record_worker_run, set_chain_height, CHAIN_HEIGHT, WORKER_RUNS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to encode Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
