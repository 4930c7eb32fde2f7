//! Prometheus metrics for the node runtime.
//!
//! Subsystem crates register their own collectors in the default registry
//! (behind their `metrics` feature); this module adds the runtime-level
//! gauges and renders everything in the Prometheus text format.
//!
//! All metrics follow the naming convention: `sc_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{register_gauge, register_int_counter_vec, Encoder, Gauge, IntCounterVec, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Height of the canonical chain tip.
    pub static ref CHAIN_HEIGHT: Gauge = register_gauge!(
        "sc_chain_height",
        "Height of the canonical chain tip"
    )
    .expect("Failed to create CHAIN_HEIGHT metric");

    /// Periodic worker runs, labeled by worker and outcome.
    pub static ref WORKER_RUNS: IntCounterVec = register_int_counter_vec!(
        "sc_runtime_worker_runs_total",
        "Periodic worker executions",
        &["worker", "outcome"]  // outcome: ok/error
    )
    .expect("Failed to create WORKER_RUNS metric");
}

/// Record the current tip height.
pub fn set_chain_height(height: u64) {
    CHAIN_HEIGHT.set(height as f64);
}

/// Record one worker execution.
pub fn record_worker_run(worker: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    WORKER_RUNS.with_label_values(&[worker, outcome]).inc();
}

/// Encode every registered metric as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_set() {
        set_chain_height(42);
        assert_eq!(CHAIN_HEIGHT.get(), 42.0);
    }

    #[test]
    fn test_gather_contains_worker_runs() {
        record_worker_run("mempool_expiry", true);
        let text = gather_metrics().unwrap();
        assert!(text.contains("sc_runtime_worker_runs_total"));
    }
}
