//! # Smith-Chain Node
//!
//! Binary entry point. Configuration comes from `SC_*` environment
//! variables; see `NodeConfig::from_env` and `TelemetryConfig::from_env`.

use anyhow::{Context, Result};
use chain_telemetry::{init_logging, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let config = NodeConfig::from_env().context("Failed to load node configuration")?;
    if telemetry.network == "devnet" {
        if let Err(e) = config.validate_for_production() {
            warn!(error = %e, "Running with an insecure configuration on devnet");
        }
    } else {
        config
            .validate_for_production()
            .context("Configuration rejected")?;
    }

    let runtime = NodeRuntime::new(config);
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
