//! Block validation.

use super::BlockService;
use crate::domain::{cumulative_difficulty, ConsensusError, ConsensusResult};
use crate::ports::BlocksmithStrategy;
use sc_01_ledger_store::{LedgerRead, LedgerStore};
use sc_02_transactions::TransactionAction;
use shared_types::codec::{compute_payload, id_from_hash};
use shared_types::entities::*;

/// Summed amounts and fees of `transactions`; overflow is `InvalidTotals`.
pub(crate) fn block_totals(transactions: &[Transaction]) -> ConsensusResult<(i64, i64)> {
    transactions
        .iter()
        .try_fold((0i64, 0i64), |(amount, fee), tx| {
            Some((amount.checked_add(tx.amount())?, fee.checked_add(tx.fee)?))
        })
        .ok_or(ConsensusError::InvalidTotals)
}

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    /// Full validation of `block` as the successor of `previous` at `now`.
    pub fn validate_block(
        &self,
        block: &Block,
        previous: &Block,
        now: Timestamp,
    ) -> ConsensusResult<()> {
        let (payload_hash, payload_length) =
            compute_payload(&block.transactions, &block.published_receipts)?;
        if payload_hash != block.payload_hash || payload_length != block.payload_length {
            return Err(ConsensusError::InvalidPayload);
        }

        let (total_amount, total_fee) = block_totals(&block.transactions)?;
        if total_fee != block.total_fee
            || total_amount != block.total_amount
            || block.total_coinbase != self.config.coinbase
        {
            return Err(ConsensusError::InvalidTotals);
        }

        if block.timestamp > now + self.config.max_clock_skew {
            return Err(ConsensusError::FutureTimestamp {
                timestamp: block.timestamp,
                now,
            });
        }

        let blocksmith_index = self.pre_validate_block(block, previous)?;

        let hash = block.compute_hash()?;
        let id = id_from_hash(&hash);
        if id == 0 {
            return Err(ConsensusError::ZeroBlockId);
        }
        if hash != block.block_hash || id != block.id {
            return Err(ConsensusError::InvalidBlockHash);
        }

        let signed = self.signer.verify_node_signature(
            &block.unsigned_bytes()?,
            &block.block_signature,
            &block.blocksmith_public_key,
        );
        if !signed {
            return Err(ConsensusError::InvalidBlockSignature);
        }

        if block.previous_block_hash != previous.block_hash {
            return Err(ConsensusError::PreviousHashMismatch);
        }

        let height = previous.height + 1;
        if let Some(existing) = self.store.block_by_height(height)? {
            let difficulty = cumulative_difficulty(
                previous.cumulative_difficulty,
                self.config.base_difficulty,
                blocksmith_index,
            );
            if existing.cumulative_difficulty > difficulty {
                return Err(ConsensusError::StaleChain { height });
            }
        }
        Ok(())
    }

    /// Eligibility and timing of the blocksmith. Returns its index.
    pub fn pre_validate_block(&self, block: &Block, previous: &Block) -> ConsensusResult<u32> {
        let index = *self
            .strategy
            .sorted_blocksmiths_map(&*self.store, previous)?
            .get(&block.blocksmith_public_key)
            .ok_or(ConsensusError::BlocksmithNotEligible(block.blocksmith_public_key))?;
        let smith_time = self.strategy.smith_time(index, previous);
        if block.timestamp < smith_time {
            return Err(ConsensusError::PrematureBlock {
                timestamp: block.timestamp,
                smith_time,
            });
        }
        Ok(index)
    }
}
