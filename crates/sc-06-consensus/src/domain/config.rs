//! Consensus configuration.

/// Timing, scoring and registry parameters of the block service.
///
/// All durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusConfig {
    /// How far a block timestamp may run ahead of the local clock.
    pub max_clock_skew: u64,
    /// Delay after the previous block before the first blocksmith may smith.
    pub smithing_period: u64,
    /// Delay between consecutive blocksmith indices.
    pub blocksmith_time_gap: u64,
    /// Time a blocksmith is given to create its block.
    pub block_creation_duration: u64,
    /// Allowance for network propagation.
    pub network_tolerance: u64,
    /// Deepest rollback performed automatically.
    pub max_rollback_depth: u64,
    /// Difficulty contributed by an index-0 block.
    pub base_difficulty: u64,
    pub max_participation_score: i64,
    /// Score granted to a newly admitted node.
    pub default_participation_score: i64,
    /// Largest score change a single block applies.
    pub max_score_change: i64,
    /// Maximum published receipts a block may carry.
    pub max_receipts_per_block: u32,
    /// Queued nodes are admitted every `admittance_cycle` blocks.
    pub admittance_cycle: u64,
    pub max_node_admittance: usize,
    /// Blocksmiths sharing each block's reward.
    pub lottery_winners: usize,
    /// Reward minted per block.
    pub coinbase: i64,
    /// The scrambled node order is rebuilt every `scramble_cycle` blocks.
    pub scramble_cycle: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_clock_skew: 15,
            smithing_period: 15,
            blocksmith_time_gap: 10,
            block_creation_duration: 5,
            network_tolerance: 5,
            max_rollback_depth: 720,
            base_difficulty: 1_000_000_000,
            max_participation_score: 1_000_000_000,
            default_participation_score: 100_000_000,
            max_score_change: 10_000_000,
            max_receipts_per_block: 20,
            admittance_cycle: 10,
            max_node_admittance: 10,
            lottery_winners: 5,
            coinbase: 500_000_000,
            scramble_cycle: 10,
        }
    }
}

impl ConsensusConfig {
    /// Short windows and cycles for tests.
    pub fn for_testing() -> Self {
        Self {
            smithing_period: 10,
            blocksmith_time_gap: 4,
            block_creation_duration: 2,
            network_tolerance: 2,
            max_rollback_depth: 10,
            admittance_cycle: 3,
            scramble_cycle: 3,
            lottery_winners: 2,
            coinbase: 1_000,
            ..Default::default()
        }
    }

    /// Offset from a smith time to the end of that blocksmith's persist window.
    pub fn window_length(&self) -> u64 {
        self.block_creation_duration + self.network_tolerance
    }
}
