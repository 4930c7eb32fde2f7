//! Blocksmith Strategy port.

use crate::domain::ConsensusResult;
use primitive_types::U256;
use sc_01_ledger_store::LedgerRead;
use shared_types::entities::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered node eligible to smith the next block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocksmith {
    pub node_id: NodeId,
    pub node_public_key: PublicKey,
    pub account_address: AccountAddress,
    pub score: i64,
    /// Position key; lower smiths earlier.
    pub node_order: U256,
}

/// Deterministic ordering of blocksmiths and their smith times.
///
/// Every method must return the same answer on every honest node given the
/// same previous block and ledger state.
pub trait BlocksmithStrategy: Send + Sync {
    /// Blocksmiths for the block after `previous`, in smithing order.
    fn sorted_blocksmiths<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        previous: &Block,
    ) -> ConsensusResult<Arc<Vec<Blocksmith>>>;

    /// Index of every eligible public key in the ordering.
    fn sorted_blocksmiths_map<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        previous: &Block,
    ) -> ConsensusResult<HashMap<PublicKey, u32>> {
        Ok(self
            .sorted_blocksmiths(ledger, previous)?
            .iter()
            .enumerate()
            .map(|(index, smith)| (smith.node_public_key, index as u32))
            .collect())
    }

    /// Earliest timestamp at which `blocksmith_index` may smith on top of
    /// `previous`.
    fn smith_time(&self, blocksmith_index: u32, previous: &Block) -> Timestamp;

    /// Precomputes the ordering on top of a new tip.
    fn sort_blocksmiths<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        block: &Block,
    ) -> ConsensusResult<()> {
        self.sorted_blocksmiths(ledger, block).map(|_| ())
    }

    /// Drops memoized orderings; called after a rollback.
    fn reset_cache(&self);
}
