//! # Cumulative Difficulty and Persist Windows
//!
//! Earlier blocksmith indices contribute more difficulty, so the chain built
//! by in-turn blocksmiths wins fork choice.
//!
//! Blocksmith `i` may smith from `smith_time(i)`. Its block may be persisted
//! during `(end(i - 1), end(i)]` where `end(i) = smith_time(i) + creation +
//! tolerance`. Index 0 may always persist.

use super::config::ConsensusConfig;
use primitive_types::U256;
use shared_types::Timestamp;

pub fn cumulative_difficulty(previous: U256, base_difficulty: u64, blocksmith_index: u32) -> U256 {
    previous + U256::from(base_difficulty) / U256::from(blocksmith_index as u64 + 1)
}

/// Persist window of one blocksmith index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistWindow {
    /// Exclusive start.
    pub start: Timestamp,
    /// Inclusive end; `None` when unbounded.
    pub end: Option<Timestamp>,
}

impl PersistWindow {
    pub fn contains(&self, now: Timestamp) -> bool {
        now > self.start && self.end.map_or(true, |end| now <= end)
    }
}

/// Window of `index > 0` given the smith time of `index - 1` and `index`.
///
/// After the genesis block there is no predecessor to race, so the window
/// has no upper bound.
pub fn persist_window(
    config: &ConsensusConfig,
    previous_smith_time: Timestamp,
    own_smith_time: Timestamp,
    previous_is_genesis: bool,
) -> PersistWindow {
    let start = previous_smith_time + config.window_length();
    let end = if previous_is_genesis {
        None
    } else {
        Some(own_smith_time + config.window_length())
    };
    PersistWindow { start, end }
}
