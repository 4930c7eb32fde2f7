/// Incomplete-queue configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncompleteQueueConfig {
    /// Seconds a block may wait for its transactions before eviction.
    pub waiting_timeout_seconds: u64,
}

impl Default for IncompleteQueueConfig {
    fn default() -> Self {
        Self {
            waiting_timeout_seconds: 60,
        }
    }
}

impl IncompleteQueueConfig {
    pub fn for_testing() -> Self {
        Self {
            waiting_timeout_seconds: 5,
        }
    }
}
