//! # Block Service Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `blocks_pushed_total` - Blocks made canonical
//! - `blocks_pooled_total` - Premature blocks diverted to the block pool
//! - `blocks_rejected_total` - Rejected blocks, by error kind
//! - `chain_rollbacks_total` - Pop-offs performed
//! - `chain_height` - Height of the canonical tip

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_PUSHED: IntCounter = register_int_counter!(
        "blocks_pushed_total",
        "Total number of blocks pushed onto the canonical chain"
    )
    .expect("Failed to create BLOCKS_PUSHED metric");

    pub static ref BLOCKS_POOLED: IntCounter = register_int_counter!(
        "blocks_pooled_total",
        "Total number of premature blocks held in the block pool"
    )
    .expect("Failed to create BLOCKS_POOLED metric");

    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "blocks_rejected_total",
        "Total number of blocks rejected, by error kind",
        &["kind"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref CHAIN_ROLLBACKS: IntCounter = register_int_counter!(
        "chain_rollbacks_total",
        "Total number of pop-offs to a common block"
    )
    .expect("Failed to create CHAIN_ROLLBACKS metric");

    pub static ref CHAIN_HEIGHT: IntGauge = register_int_gauge!(
        "chain_height",
        "Height of the canonical chain tip"
    )
    .expect("Failed to create CHAIN_HEIGHT metric");
}

#[cfg(feature = "metrics")]
pub fn record_pushed(height: u64) {
    BLOCKS_PUSHED.inc();
    CHAIN_HEIGHT.set(height as i64);
}

#[cfg(feature = "metrics")]
pub fn record_pooled() {
    BLOCKS_POOLED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(kind: &str) {
    BLOCKS_REJECTED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_rollback(height: u64) {
    CHAIN_ROLLBACKS.inc();
    CHAIN_HEIGHT.set(height as i64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_pushed(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pooled() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rollback(_height: u64) {}
