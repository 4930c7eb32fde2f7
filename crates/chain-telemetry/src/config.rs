//! Logging configuration read from `SC_*` environment variables.

use std::env;

const DEFAULT_SERVICE: &str = "smith-chain";
const DEFAULT_NETWORK: &str = "testnet";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Attached to the startup log line.
    pub service_name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// With `false` no fmt layer is installed and events are only filtered.
    pub console_output: bool,
    pub json_logs: bool,
    /// `devnet`, `testnet` or `mainnet`. On `devnet` the runtime tolerates
    /// an insecure node configuration.
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Reads `SC_SERVICE_NAME`, `SC_LOG_LEVEL`, `SC_CONSOLE_OUTPUT`,
    /// `SC_JSON_LOGS` and `SC_NETWORK`. JSON output defaults to on inside
    /// containers (`KUBERNETES_SERVICE_HOST` or `DOCKER_CONTAINER` set).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let in_container =
            env::var_os("KUBERNETES_SERVICE_HOST").is_some() || env::var_os("DOCKER_CONTAINER").is_some();

        Self {
            service_name: env::var("SC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env::var("SC_LOG_LEVEL").unwrap_or(defaults.log_level),
            console_output: flag("SC_CONSOLE_OUTPUT").unwrap_or(defaults.console_output),
            json_logs: flag("SC_JSON_LOGS").unwrap_or(in_container),
            network: env::var("SC_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// `<service>-<network>`, e.g. `smith-chain-devnet`.
    pub fn full_service_name(&self) -> String {
        format!("{}-{}", self.service_name, self.network)
    }
}

/// `1`/`true`/`yes` and `0`/`false`/`no`, case-insensitive. Anything else
/// counts as unset.
fn flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
