//! Push state machine and persist-window decision.

use super::registry;
use super::{scrambled_order, BlockService, PushMode, PushOutcome};
use crate::domain::{
    cumulative_difficulty, participation_delta, persist_window, ConsensusError, ConsensusResult,
    ScrambledNodes,
};
use crate::metrics;
use crate::ports::{Blocksmith, BlocksmithStrategy};
use parking_lot::RwLockWriteGuard;
use sc_01_ledger_store::{LedgerRead, LedgerStore, LedgerTx, LedgerWrite};
use sc_02_transactions::{BalanceView, TransactionAction};
use sc_03_mempool::rollback_quietly;
use shared_bus::ChainEvent;
use shared_types::entities::*;
use std::sync::Arc;
use tracing::{info, warn};

/// What a block changed beyond the ledger tables.
struct AppliedBlock {
    /// Set at scramble-cycle heights, installed once the push commits.
    scrambled: Option<ScrambledNodes>,
}

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    /// Pushes `block` on top of `previous`, the current tip.
    ///
    /// A block whose blocksmith is neither first in line nor inside its
    /// persist window goes to the block pool instead, and the call still
    /// succeeds.
    pub fn push_block(
        &self,
        previous: &Block,
        block: Block,
        broadcast: bool,
    ) -> ConsensusResult<PushOutcome> {
        let chain = self.chain_lock.write();
        self.push_locked(&chain, Some(previous), block, broadcast, PushMode::FirstPush)
    }

    /// Persists a pooled block whose turn has come, bypassing the pool
    /// duplicate check and the persist window.
    pub fn persist_pooled_block(
        &self,
        previous: &Block,
        block: Block,
    ) -> ConsensusResult<PushOutcome> {
        let chain = self.chain_lock.write();
        self.push_locked(&chain, Some(previous), block, false, PushMode::PersistPooled)
    }

    /// Whether blocksmith `index` may persist on top of `previous` at `now`.
    pub fn can_persist_block(&self, index: u32, previous: &Block, now: Timestamp) -> bool {
        if index == 0 {
            return true;
        }
        persist_window(
            &self.config,
            self.strategy.smith_time(index - 1, previous),
            self.strategy.smith_time(index, previous),
            previous.is_genesis(),
        )
        .contains(now)
    }

    /// The push state machine. `previous` is `None` only for genesis.
    pub(super) fn push_locked(
        &self,
        _chain: &RwLockWriteGuard<'_, ()>,
        previous: Option<&Block>,
        mut block: Block,
        broadcast: bool,
        mode: PushMode,
    ) -> ConsensusResult<PushOutcome> {
        let tip = self.store.last_block()?;
        match (previous, &tip) {
            (Some(p), Some(t)) if p.id == t.id => {}
            (None, None) => {}
            _ => return Err(ConsensusError::UnknownPreviousBlock),
        }

        let mut blocksmith_index = 0;
        let mut blocksmiths: Option<Arc<Vec<Blocksmith>>> = None;
        if let Some(previous) = previous {
            block.height = previous.height + 1;
            blocksmith_index = *self
                .strategy
                .sorted_blocksmiths_map(&*self.store, previous)?
                .get(&block.blocksmith_public_key)
                .ok_or(ConsensusError::BlocksmithNotEligible(block.blocksmith_public_key))?;
            if mode == PushMode::FirstPush && self.block_pool.get(blocksmith_index).is_some() {
                return Err(ConsensusError::DuplicatePool(blocksmith_index));
            }
            block.cumulative_difficulty = cumulative_difficulty(
                previous.cumulative_difficulty,
                self.config.base_difficulty,
                blocksmith_index,
            );
            blocksmiths = Some(self.strategy.sorted_blocksmiths(&*self.store, previous)?);
        } else {
            block.height = 0;
        }

        let mut db = self.store.begin()?;
        let applied = match self.apply_block(&mut db, &mut block, blocksmiths.as_deref()) {
            Ok(applied) => applied,
            Err(e) => {
                rollback_quietly(db);
                return Err(e);
            }
        };

        if let Some(previous) = previous {
            let premature = mode == PushMode::FirstPush
                && blocksmith_index > 0
                && !self.can_persist_block(blocksmith_index, previous, self.time.now());
            if premature {
                rollback_quietly(db);
                return Ok(self.pool_block(block, blocksmith_index, broadcast));
            }
        }

        db.commit()?;

        if let Err(e) = self.strategy.sort_blocksmiths(&*self.store, &block) {
            warn!(block_height = block.height, error = %e, "[sc-06] Sorting blocksmiths for new tip failed");
        }
        self.block_pool.clear();
        if broadcast && blocksmith_index == 0 {
            self.publisher
                .publish(ChainEvent::BlockBroadcast(block.strip_transactions()));
        }
        if let Some(nodes) = applied.scrambled {
            *self.scrambled.write() = Some(nodes);
        }
        metrics::record_pushed(block.height);
        info!(
            block_height = block.height,
            block_id = block.id,
            blocksmith_index,
            transactions = block.transactions.len(),
            "[sc-06] Block pushed"
        );
        self.publisher.publish(ChainEvent::BlockPushed(block.clone()));
        Ok(PushOutcome::Pushed(block))
    }

    fn pool_block(&self, block: Block, blocksmith_index: u32, broadcast: bool) -> PushOutcome {
        info!(
            block_height = block.height,
            block_id = block.id,
            blocksmith_index,
            "[sc-06] Premature block pooled"
        );
        if broadcast {
            self.publisher
                .publish(ChainEvent::BlockBroadcast(block.strip_transactions()));
        }
        self.publisher.publish(ChainEvent::BlockPooled {
            block_id: block.id,
            block_height: block.height,
            blocksmith_index,
        });
        self.block_pool.insert(block, blocksmith_index);
        metrics::record_pooled();
        PushOutcome::Pooled { blocksmith_index }
    }

    /// Steps run inside the push transaction: transactions, receipts,
    /// scores, rewards and registry maintenance.
    fn apply_block(
        &self,
        db: &mut dyn LedgerWrite,
        block: &mut Block,
        blocksmiths: Option<&Vec<Blocksmith>>,
    ) -> ConsensusResult<AppliedBlock> {
        let height = block.height;
        let block_id = block.id;
        let genesis = block.is_genesis();

        self.hold_expiry.expire_holds(db, height)?;
        db.insert_block(block)?;

        for (position, tx) in block.transactions.iter_mut().enumerate() {
            tx.block_id = Some(block_id);
            tx.height = Some(height);
            tx.transaction_index = Some(position as u32);

            if db.mempool_transaction(tx.id)?.is_some() {
                tx.undo_apply_unconfirmed(db)?;
            }
            if !genesis {
                tx.validate(&*db, &*self.signer, BalanceView::Confirmed)
                    .map_err(|source| ConsensusError::TransactionInvalid { tx_id: tx.id, source })?;
            }
            tx.apply_confirmed(db, height)?;
            db.insert_transaction(tx)?;
        }

        if !genesis {
            let ids: Vec<TransactionId> = block.transactions.iter().map(|tx| tx.id).collect();
            db.remove_mempool_transactions(&ids)?;
        }

        let receipts = self.receipt_processor.process(db, block)?;

        if height > 0 {
            let blocksmiths = blocksmiths
                .ok_or(ConsensusError::BlocksmithNotFound(block.blocksmith_public_key))?;
            let delta = participation_delta(
                receipts.linked,
                receipts.unlinked,
                self.config.max_receipts_per_block,
                self.config.max_score_change,
            );
            registry::update_participation_scores(
                db,
                blocksmiths,
                &block.blocksmith_public_key,
                delta,
                height,
                &self.config,
            )?;
            registry::distribute_rewards(
                db,
                blocksmiths,
                block
                    .total_fee
                    .checked_add(block.total_coinbase)
                    .ok_or(ConsensusError::InvalidTotals)?,
                self.config.lottery_winners,
                height,
            )?;
        }

        registry::expel_nodes(db, height)?;
        if height == 0 || height % self.config.admittance_cycle.max(1) == 0 {
            registry::admit_nodes(db, height, &self.config)?;
        }

        let scrambled = if height % self.config.scramble_cycle.max(1) == 0 {
            Some(scrambled_order(&*db, block)?)
        } else {
            None
        };
        Ok(AppliedBlock { scrambled })
    }
}
