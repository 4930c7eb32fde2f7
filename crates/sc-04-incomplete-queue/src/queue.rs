//! # Incomplete Block Queue

use crate::config::IncompleteQueueConfig;
use parking_lot::Mutex;
use sc_01_ledger_store::TimeSource;
use shared_bus::{ChainEvent, EventPublisher};
use shared_types::entities::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A block waiting for transactions, with its enqueue time.
#[derive(Debug, Clone)]
pub struct BlockWithMetaData {
    pub block: Block,
    /// One slot per entry of `block.transaction_ids`.
    pub slots: Vec<Option<Transaction>>,
    pub enqueued_at: Timestamp,
}

impl BlockWithMetaData {
    fn new(block: Block, enqueued_at: Timestamp) -> Self {
        let mut slots = vec![None; block.transaction_ids.len()];
        for tx in &block.transactions {
            if let Some(pos) = block.transaction_ids.iter().position(|id| *id == tx.id) {
                slots[pos] = Some(tx.clone());
            }
        }
        Self {
            block,
            slots,
            enqueued_at,
        }
    }

    /// The block with every slot filled, in position order.
    fn into_complete(self) -> Option<Block> {
        let mut block = self.block;
        block.transactions = self.slots.into_iter().collect::<Option<Vec<_>>>()?;
        Some(block)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    blocks: HashMap<BlockId, BlockWithMetaData>,
    /// Transactions each pending block still needs, with their positions.
    required: HashMap<BlockId, HashMap<TransactionId, u32>>,
    /// Pending blocks waiting on each transaction.
    waiters: HashMap<TransactionId, HashSet<BlockId>>,
}

impl QueueState {
    fn remove_block(&mut self, block_id: BlockId) -> Option<BlockWithMetaData> {
        if let Some(required) = self.required.remove(&block_id) {
            for tx_id in required.keys() {
                if let Some(waiting) = self.waiters.get_mut(tx_id) {
                    waiting.remove(&block_id);
                    if waiting.is_empty() {
                        self.waiters.remove(tx_id);
                    }
                }
            }
        }
        self.blocks.remove(&block_id)
    }
}

/// Blocks received before all of their transactions.
pub struct BlockIncompleteQueue {
    config: IncompleteQueueConfig,
    time: Arc<dyn TimeSource>,
    publisher: Arc<dyn EventPublisher>,
    state: Mutex<QueueState>,
}

impl BlockIncompleteQueue {
    pub fn new(
        config: IncompleteQueueConfig,
        time: Arc<dyn TimeSource>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            time,
            publisher,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Stores `block` stamped with the current time. Transactions already
    /// attached to the block are slotted by ID.
    ///
    /// Re-enqueueing a known block only refreshes its timestamp.
    pub fn enqueue(&self, block: Block) {
        let now = self.time.now();
        let mut state = self.state.lock();
        if let Some(existing) = state.blocks.get_mut(&block.id) {
            existing.enqueued_at = now;
            return;
        }
        debug!(block_id = block.id, block_height = block.height, "[sc-04] Block queued");
        state.blocks.insert(block.id, BlockWithMetaData::new(block, now));
    }

    pub fn contains(&self, block_id: BlockId) -> bool {
        self.state.lock().blocks.contains_key(&block_id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transaction IDs `block_id` still waits for, sorted.
    pub fn missing_transactions(&self, block_id: BlockId) -> Vec<TransactionId> {
        let state = self.state.lock();
        let mut ids: Vec<TransactionId> = state
            .required
            .get(&block_id)
            .map(|r| r.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Records the transactions `block_id` is missing and their positions.
    ///
    /// Returns `false` when the block is not queued.
    pub fn set_requirements(&self, block_id: BlockId, requirements: HashMap<TransactionId, u32>) -> bool {
        let mut state = self.state.lock();
        if !state.blocks.contains_key(&block_id) {
            warn!(block_id, "[sc-04] Requirements for a block that is not queued");
            return false;
        }
        for tx_id in requirements.keys() {
            state.waiters.entry(*tx_id).or_default().insert(block_id);
        }
        state.required.entry(block_id).or_default().extend(requirements);
        true
    }

    /// Slots `tx` into every block waiting on it and returns the blocks
    /// that became complete.
    pub fn satisfy(&self, tx: &Transaction) -> Vec<Block> {
        let mut state = self.state.lock();
        let Some(waiting) = state.waiters.remove(&tx.id) else {
            return Vec::new();
        };

        let mut completed_ids = Vec::new();
        for block_id in waiting {
            let position = match state.required.get_mut(&block_id) {
                Some(required) => required.remove(&tx.id),
                None => None,
            };
            let Some(position) = position else { continue };

            if let Some(entry) = state.blocks.get_mut(&block_id) {
                if let Some(slot) = entry.slots.get_mut(position as usize) {
                    *slot = Some(tx.clone());
                }
            }
            if state.required.get(&block_id).map_or(true, |r| r.is_empty()) {
                completed_ids.push(block_id);
            }
        }

        let mut completed = Vec::new();
        for block_id in completed_ids {
            let Some(entry) = state.remove_block(block_id) else { continue };
            match entry.into_complete() {
                Some(block) => {
                    info!(block_id, block_height = block.height, "[sc-04] Block completed");
                    completed.push(block);
                }
                None => warn!(block_id, "[sc-04] Dropping block with unfilled slots"),
            }
        }
        completed.sort_by_key(|b| (b.height, b.id));
        completed
    }

    /// Drops blocks that waited longer than the configured timeout.
    pub fn evict_stale(&self) -> usize {
        let now = self.time.now();
        let timeout = self.config.waiting_timeout_seconds;
        let mut state = self.state.lock();
        let stale: Vec<BlockId> = state
            .blocks
            .iter()
            .filter(|(_, entry)| entry.enqueued_at + timeout < now)
            .map(|(id, _)| *id)
            .collect();
        for block_id in &stale {
            state.remove_block(*block_id);
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "[sc-04] Evicted stale incomplete blocks");
        }
        stale.len()
    }

    /// Asks the network layer to fetch `transaction_ids` from `peer`.
    pub fn request_missing(&self, transaction_ids: Vec<TransactionId>, block_id: BlockId, peer: PeerId) {
        debug!(block_id, count = transaction_ids.len(), "[sc-04] Requesting missing transactions");
        self.publisher.publish(ChainEvent::RequestBlockTransactions {
            block_id,
            transaction_ids,
            peer,
        });
    }
}
