//! # Mempool Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `mempool_size` - Pending transactions after the last mutation
//! - `mempool_transactions_admitted_total` - Transactions admitted
//! - `mempool_transactions_expired_total` - Transactions removed by expiry
//! - `mempool_transactions_rejected_total` - Rejections by error kind

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref MEMPOOL_SIZE: IntGauge = register_int_gauge!(
        "mempool_size",
        "Number of pending transactions in the mempool"
    )
    .expect("Failed to create MEMPOOL_SIZE metric");

    pub static ref TRANSACTIONS_ADMITTED: IntCounter = register_int_counter!(
        "mempool_transactions_admitted_total",
        "Total number of transactions admitted to the mempool"
    )
    .expect("Failed to create TRANSACTIONS_ADMITTED metric");

    pub static ref TRANSACTIONS_EXPIRED: IntCounter = register_int_counter!(
        "mempool_transactions_expired_total",
        "Total number of mempool transactions removed by expiry"
    )
    .expect("Failed to create TRANSACTIONS_EXPIRED metric");

    pub static ref TRANSACTIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "mempool_transactions_rejected_total",
        "Total number of transactions rejected, by error kind",
        &["kind"]
    )
    .expect("Failed to create TRANSACTIONS_REJECTED metric");
}

#[cfg(feature = "metrics")]
pub fn set_mempool_size(size: usize) {
    MEMPOOL_SIZE.set(size as i64);
}

#[cfg(feature = "metrics")]
pub fn record_admitted() {
    TRANSACTIONS_ADMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_expired(count: usize) {
    TRANSACTIONS_EXPIRED.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_rejected(kind: &str) {
    TRANSACTIONS_REJECTED.with_label_values(&[kind]).inc();
}

#[cfg(not(feature = "metrics"))]
pub fn set_mempool_size(_size: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_admitted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_expired(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_kind: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_callable() {
        set_mempool_size(3);
        record_admitted();
        record_expired(2);
        record_rejected("Duplicate");
    }
}
