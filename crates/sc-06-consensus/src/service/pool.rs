//! Block pool scanning and incomplete-block routing.

use super::{BlockService, PushMode, PushOutcome, QueueOutcome};
use crate::domain::{ConsensusError, ConsensusResult};
use crate::ports::BlocksmithStrategy;
use sc_01_ledger_store::{LedgerRead, LedgerStore};
use shared_types::entities::*;
use std::collections::HashMap;
use tracing::debug;

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    /// Persists the first pooled block, by blocksmith index, whose persist
    /// window has opened. Returns the pushed block.
    pub fn scan_block_pool(&self) -> ConsensusResult<Option<Block>> {
        let chain = self.chain_lock.write();
        if self.block_pool.is_empty() {
            return Ok(None);
        }
        let tip = self.last_block()?;
        let now = self.time.now();

        for (blocksmith_index, block) in self.block_pool.get_all() {
            if block.previous_block_hash != tip.block_hash
                || !self.can_persist_block(blocksmith_index, &tip, now)
            {
                continue;
            }
            let block_id = block.id;
            debug!(blocksmith_index, block_id, "[sc-06] Persisting pooled block");
            return match self.push_locked(&chain, Some(&tip), block, false, PushMode::PersistPooled) {
                Ok(PushOutcome::Pushed(block)) => Ok(Some(block)),
                Ok(PushOutcome::Pooled { .. }) => Ok(None),
                Err(e) => {
                    let error = ConsensusError::ScanPool {
                        blocksmith_index,
                        source: Box::new(e),
                    };
                    self.rejected(block_id, tip.height + 1, &error);
                    Err(error)
                }
            };
        }
        Ok(None)
    }

    /// Resolves the transaction bodies of a block received as an ID list.
    ///
    /// Bodies found in the mempool are slotted in; if any are missing the
    /// block is queued and the missing IDs are requested from `peer`.
    pub fn process_queue_block(&self, mut block: Block, peer: PeerId) -> ConsensusResult<QueueOutcome> {
        if block.transaction_ids.is_empty() {
            return Ok(QueueOutcome::Ready(block));
        }
        if self.incomplete_queue.contains(block.id) {
            return Ok(QueueOutcome::AlreadyQueued);
        }

        let mut found = Vec::with_capacity(block.transaction_ids.len());
        let mut missing: HashMap<TransactionId, u32> = HashMap::new();
        for (position, id) in block.transaction_ids.iter().enumerate() {
            match self.store.mempool_transaction(*id)? {
                Some(entry) => found.push(Transaction::from_bytes(&entry.transaction_bytes)?),
                None => {
                    missing.insert(*id, position as u32);
                }
            }
        }
        block.transactions = found;

        if missing.is_empty() {
            return Ok(QueueOutcome::Ready(block));
        }

        let block_id = block.id;
        let mut missing_ids: Vec<TransactionId> = missing.keys().copied().collect();
        missing_ids.sort_unstable();
        self.incomplete_queue.enqueue(block);
        self.incomplete_queue.set_requirements(block_id, missing);
        self.incomplete_queue.request_missing(missing_ids, block_id, peer);
        Ok(QueueOutcome::Queued)
    }
}
