//! Mempool configuration.

use std::time::Duration;

/// Limits and timings of the mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolConfig {
    /// Maximum pending entries. `0` disables the limit.
    pub max_pool_size: usize,
    /// Age in seconds after which an entry expires.
    pub expiry_seconds: u64,
    /// Maximum transactions selected for one block.
    pub max_transactions_per_block: usize,
    /// Maximum total serialized size of the selected transactions.
    pub max_payload_bytes: usize,
    /// How long an issued receipt is remembered for duplicate suppression.
    pub receipt_reminder_ttl: Duration,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 5000,
            expiry_seconds: 5 * 60 * 60,
            max_transactions_per_block: 1000,
            max_payload_bytes: 1024 * 1024,
            receipt_reminder_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl MempoolConfig {
    /// Creates a small config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_pool_size: 100,
            expiry_seconds: 60,
            max_transactions_per_block: 50,
            ..Default::default()
        }
    }
}
