//! # Registry Blocksmith Strategy
//!
//! Orders the registered nodes by `hash(seed || node_id) / (score + 1)`
//! ascending, ties by node ID. Higher participation scores and luckier
//! hashes smith earlier.

use crate::domain::{ConsensusConfig, ConsensusResult};
use crate::ports::{Blocksmith, BlocksmithStrategy};
use parking_lot::Mutex;
use primitive_types::U256;
use sc_01_ledger_store::LedgerRead;
use shared_types::codec::sha3_256;
use shared_types::entities::*;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Orderings kept per previous block.
const CACHE_CAPACITY: usize = 8;

pub struct RegistryBlocksmithStrategy {
    smithing_period: u64,
    blocksmith_time_gap: u64,
    cache: Mutex<VecDeque<(BlockId, Arc<Vec<Blocksmith>>)>>,
}

impl RegistryBlocksmithStrategy {
    pub fn new(config: &ConsensusConfig) -> Self {
        Self {
            smithing_period: config.smithing_period,
            blocksmith_time_gap: config.blocksmith_time_gap,
            cache: Mutex::new(VecDeque::with_capacity(CACHE_CAPACITY)),
        }
    }

    fn node_order(seed: &Hash, node_id: NodeId, score: i64) -> U256 {
        let mut input = seed.to_vec();
        input.extend_from_slice(&node_id.to_le_bytes());
        let lottery = U256::from_big_endian(&sha3_256(&input));
        lottery / U256::from(score.max(0) as u64 + 1)
    }

    fn compute<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        previous: &Block,
    ) -> ConsensusResult<Vec<Blocksmith>> {
        let mut smiths = Vec::new();
        for registration in ledger.node_registrations_by_status(RegistrationStatus::Registered)? {
            let score = ledger
                .participation_score(registration.node_id)?
                .map_or(0, |s| s.score);
            smiths.push(Blocksmith {
                node_id: registration.node_id,
                node_public_key: registration.node_public_key,
                account_address: registration.account_address,
                score,
                node_order: Self::node_order(&previous.block_seed, registration.node_id, score),
            });
        }
        smiths.sort_by(|a, b| {
            a.node_order
                .cmp(&b.node_order)
                .then(a.node_id.cmp(&b.node_id))
        });
        Ok(smiths)
    }
}

impl BlocksmithStrategy for RegistryBlocksmithStrategy {
    fn sorted_blocksmiths<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        previous: &Block,
    ) -> ConsensusResult<Arc<Vec<Blocksmith>>> {
        if let Some((_, smiths)) = self.cache.lock().iter().find(|(id, _)| *id == previous.id) {
            return Ok(smiths.clone());
        }

        let smiths = Arc::new(self.compute(ledger, previous)?);
        let mut cache = self.cache.lock();
        if cache.len() == CACHE_CAPACITY {
            cache.pop_front();
        }
        cache.push_back((previous.id, smiths.clone()));
        trace!(
            block_height = previous.height,
            count = smiths.len(),
            "[sc-06] Blocksmiths sorted"
        );
        Ok(smiths)
    }

    fn smith_time(&self, blocksmith_index: u32, previous: &Block) -> Timestamp {
        previous.timestamp + self.smithing_period + blocksmith_index as u64 * self.blocksmith_time_gap
    }

    fn reset_cache(&self) {
        self.cache.lock().clear();
    }
}
