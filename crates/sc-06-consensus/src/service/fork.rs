//! Block reception, fork resolution and pop-off.

use super::{BlockService, PushMode, PushOutcome, QueueOutcome, ReceiveOutcome};
use crate::domain::{ConsensusError, ConsensusResult};
use crate::metrics;
use crate::ports::BlocksmithStrategy;
use parking_lot::RwLockWriteGuard;
use sc_01_ledger_store::{LedgerRead, LedgerStore, LedgerTx, LedgerWrite};
use sc_03_mempool::rollback_quietly;
use shared_bus::ChainEvent;
use shared_types::entities::*;
use tracing::{error, info, warn};

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    /// Handles a block received from `peer`, signed over by `sender`.
    ///
    /// A block that is already on the chain earns its sender one receipt;
    /// asking again fails as a duplicate.
    pub fn receive_block(
        &self,
        sender: PublicKey,
        peer: PeerId,
        block: Block,
    ) -> ConsensusResult<ReceiveOutcome> {
        let receipts = self.mempool.receipts();
        if self.store.block_by_id(block.id)?.is_some() {
            if receipts.was_issued(&block.block_hash, &sender)? {
                return Err(ConsensusError::DuplicateBlock(block.id));
            }
            let reference = self.last_block()?;
            let receipt =
                receipts.issue(ReceiptDatumType::Block, block.block_hash, sender, &reference)?;
            return Ok(ReceiveOutcome::Acknowledged(receipt));
        }

        match self.process_queue_block(block, peer)? {
            QueueOutcome::Queued => Ok(ReceiveOutcome::Queued),
            QueueOutcome::AlreadyQueued => Ok(ReceiveOutcome::AlreadyQueued),
            QueueOutcome::Ready(block) => {
                let block_hash = block.block_hash;
                let outcome = self.process_completed_block(block)?;
                let reference = self.last_block()?;
                let receipt =
                    receipts.issue(ReceiptDatumType::Block, block_hash, sender, &reference)?;
                Ok(ReceiveOutcome::Processed { outcome, receipt })
            }
        }
    }

    /// Pushes a block whose transactions are all known.
    ///
    /// A block extending the tip is validated and pushed. A block competing
    /// with the tip for the same parent, with an earlier timestamp, replaces
    /// the tip when it validates against that parent.
    pub fn process_completed_block(&self, block: Block) -> ConsensusResult<PushOutcome> {
        let chain = self.chain_lock.write();
        let (id, height) = (block.id, block.height);
        let result = self.process_completed_locked(&chain, block);
        if let Err(e) = &result {
            self.rejected(id, height, e);
        }
        result
    }

    fn process_completed_locked(
        &self,
        chain: &RwLockWriteGuard<'_, ()>,
        block: Block,
    ) -> ConsensusResult<PushOutcome> {
        let tip = self.last_block()?;
        let now = self.time.now();

        if block.previous_block_hash == tip.block_hash {
            self.validate_block(&block, &tip, now)?;
            return self.push_locked(chain, Some(&tip), block, true, PushMode::FirstPush);
        }

        let competes = !tip.is_genesis()
            && block.previous_block_hash == tip.previous_block_hash
            && block.timestamp < tip.timestamp;
        if !competes {
            return Err(ConsensusError::UnknownPreviousBlock);
        }

        let common = self
            .store
            .block_by_height(tip.height - 1)?
            .ok_or(ConsensusError::UnknownPreviousBlock)?;
        self.validate_block(&block, &common, now)
            .map_err(|e| ConsensusError::ForkSwitchFailed { source: Box::new(e) })?;

        let (popped, backup) = self.pop_off_locked(chain, &common)?;
        if popped.is_empty() {
            return Err(ConsensusError::ForkSwitchFailed {
                source: Box::new(ConsensusError::UnknownPreviousBlock),
            });
        }

        let result = match self.push_locked(chain, Some(&common), block, true, PushMode::PersistPooled) {
            Ok(outcome) => {
                info!(
                    common_height = common.height,
                    "[sc-06] Switched to competing block"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.restore_popped(chain, popped, &e);
                Err(ConsensusError::ForkSwitchFailed { source: Box::new(e) })
            }
        };

        if let Some(key) = backup {
            if let Err(e) = self.mempool.restore_backup(&key) {
                warn!(error = %e, key, "[sc-06] Restoring mempool backup failed");
            }
        }
        result
    }

    /// Re-pushes blocks removed by a failed fork switch, oldest first.
    fn restore_popped(
        &self,
        chain: &RwLockWriteGuard<'_, ()>,
        popped: Vec<Block>,
        cause: &ConsensusError,
    ) {
        for original in popped.into_iter().rev() {
            let restored = self.last_block().and_then(|previous| {
                self.push_locked(chain, Some(&previous), original, false, PushMode::PersistPooled)
            });
            if let Err(restore) = restored {
                error!(
                    error = %cause,
                    restore_error = %restore,
                    "[sc-06] Restoring popped block failed"
                );
                return;
            }
        }
    }

    /// Rolls the chain back to `common`, returning the popped blocks tip
    /// first with their published receipts.
    ///
    /// Refuses, returning nothing, when `common` is deeper than the maximum
    /// rollback depth.
    pub fn pop_off_to_block(&self, common: &Block) -> ConsensusResult<Vec<Block>> {
        let chain = self.chain_lock.write();
        Ok(self.pop_off_locked(&chain, common)?.0)
    }

    /// Pop-off under the chain lock. Also returns the key of the mempool
    /// backup, if one was written.
    fn pop_off_locked(
        &self,
        _chain: &RwLockWriteGuard<'_, ()>,
        common: &Block,
    ) -> ConsensusResult<(Vec<Block>, Option<String>)> {
        let tip = self.last_block()?;
        if common.height >= tip.height {
            return Ok((Vec::new(), None));
        }
        if common.height + self.config.max_rollback_depth < tip.height {
            warn!(
                tip_height = tip.height,
                common_height = common.height,
                max_depth = self.config.max_rollback_depth,
                "[sc-06] Hard fork beyond rollback depth, manual intervention required"
            );
            return Ok((Vec::new(), None));
        }

        let mut popped = Vec::new();
        for height in (common.height + 1..=tip.height).rev() {
            if let Some(mut block) = self.store.block_by_height(height)? {
                block.published_receipts = self.store.published_receipts_at(height)?;
                popped.push(block);
            }
        }

        let mut db = self.store.begin()?;
        let staged = self
            .mempool
            .backup_for_rollback(&mut db, common.height)
            .map_err(ConsensusError::from)
            .and_then(|key| -> ConsensusResult<Option<String>> {
                db.rollback_to_height(common.height)?;
                Ok(key)
            });
        let backup = match staged {
            Ok(key) => key,
            Err(e) => {
                rollback_quietly(db);
                return Err(e);
            }
        };
        db.commit()?;

        self.strategy.reset_cache();
        *self.scrambled.write() = None;
        self.block_pool.clear();
        metrics::record_rollback(common.height);
        info!(
            common_height = common.height,
            popped = popped.len(),
            "[sc-06] Chain rolled back"
        );
        self.publisher.publish(ChainEvent::ChainRolledBack {
            common_block_height: common.height,
            popped_blocks: popped.len(),
        });
        Ok((popped, backup))
    }
}
