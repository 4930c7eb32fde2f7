//! Block Service - Core business logic
//!
//! # Architecture
//! - Every block-mutating path (push, pop-off, pool scan) holds the chain
//!   write lock for its whole duration; queries never take it.
//! - Each push runs inside one ledger transaction and either commits the
//!   whole block or nothing.
//! - Premature blocks are diverted to the block pool, blocks with missing
//!   bodies to the incomplete queue.

mod fork;
mod generate;
mod pool;
mod push;
pub mod registry;
mod validation;


use crate::domain::{scramble_nodes, ConsensusConfig, ConsensusError, ConsensusResult, ScrambledNodes};
use crate::metrics;
use crate::ports::{BlocksmithStrategy, HoldExpiry, ReceiptProcessor};
use parking_lot::RwLock;
use sc_01_ledger_store::{LedgerRead, LedgerStore, TimeSource};
use sc_03_mempool::MempoolService;
use sc_04_incomplete_queue::BlockIncompleteQueue;
use sc_05_block_pool::BlockPool;
use shared_bus::EventPublisher;
use shared_crypto::NodeSigner;
use shared_types::entities::*;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a push treats the block pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// First push of a block: a pooled block at the same index is a
    /// duplicate and premature blocks are diverted to the pool.
    FirstPush,
    /// Persisting a block whose turn has come; skips both pool checks.
    PersistPooled,
}

/// Result of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The block is the new canonical tip.
    Pushed(Block),
    /// The block waits in the block pool for its persist window.
    Pooled { blocksmith_index: u32 },
}

/// Result of routing a block through the incomplete queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Every transaction body is present.
    Ready(Block),
    /// Queued until the missing transactions arrive.
    Queued,
    /// Already waiting in the queue.
    AlreadyQueued,
}

/// Result of receiving a block from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Queued,
    AlreadyQueued,
    /// The block was processed and the sender receives a receipt.
    Processed {
        outcome: PushOutcome,
        receipt: BatchReceipt,
    },
    /// The block was already known; the sender had no receipt for it yet.
    Acknowledged(BatchReceipt),
}

/// Dependencies for BlockService
pub struct BlockServiceDependencies<S: LedgerStore, B: BlocksmithStrategy> {
    pub store: Arc<S>,
    pub strategy: Arc<B>,
    pub mempool: Arc<MempoolService<S>>,
    pub incomplete_queue: Arc<BlockIncompleteQueue>,
    pub block_pool: Arc<dyn BlockPool>,
    pub signer: Arc<dyn NodeSigner>,
    pub publisher: Arc<dyn EventPublisher>,
    pub receipt_processor: Arc<dyn ReceiptProcessor>,
    pub hold_expiry: Arc<dyn HoldExpiry>,
    pub time: Arc<dyn TimeSource>,
    pub config: ConsensusConfig,
}

/// Block Service
pub struct BlockService<S: LedgerStore, B: BlocksmithStrategy> {
    store: Arc<S>,
    strategy: Arc<B>,
    mempool: Arc<MempoolService<S>>,
    incomplete_queue: Arc<BlockIncompleteQueue>,
    block_pool: Arc<dyn BlockPool>,
    signer: Arc<dyn NodeSigner>,
    publisher: Arc<dyn EventPublisher>,
    receipt_processor: Arc<dyn ReceiptProcessor>,
    hold_expiry: Arc<dyn HoldExpiry>,
    time: Arc<dyn TimeSource>,
    config: ConsensusConfig,
    /// Chain write lock.
    chain_lock: RwLock<()>,
    scrambled: RwLock<Option<ScrambledNodes>>,
}

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    pub fn new(deps: BlockServiceDependencies<S, B>) -> Self {
        Self {
            store: deps.store,
            strategy: deps.strategy,
            mempool: deps.mempool,
            incomplete_queue: deps.incomplete_queue,
            block_pool: deps.block_pool,
            signer: deps.signer,
            publisher: deps.publisher,
            receipt_processor: deps.receipt_processor,
            hold_expiry: deps.hold_expiry,
            time: deps.time,
            config: deps.config,
            chain_lock: RwLock::new(()),
            scrambled: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn mempool(&self) -> &Arc<MempoolService<S>> {
        &self.mempool
    }

    pub fn incomplete_queue(&self) -> &Arc<BlockIncompleteQueue> {
        &self.incomplete_queue
    }

    pub fn block_pool(&self) -> &Arc<dyn BlockPool> {
        &self.block_pool
    }

    // === QUERIES ===

    pub fn last_block(&self) -> ConsensusResult<Block> {
        self.store.last_block()?.ok_or(ConsensusError::MissingGenesis)
    }

    pub fn block_by_height(&self, height: u64) -> ConsensusResult<Option<Block>> {
        Ok(self.store.block_by_height(height)?)
    }

    /// Up to `limit` blocks from `height`, published receipts attached.
    pub fn blocks_from_height(&self, height: u64, limit: usize) -> ConsensusResult<Vec<Block>> {
        let mut blocks = self.store.blocks_from_height(height, limit)?;
        for block in &mut blocks {
            block.published_receipts = self.store.published_receipts_at(block.height)?;
        }
        Ok(blocks)
    }

    /// Transaction bodies a peer asked for, from the mempool or the chain.
    pub fn get_transactions_by_ids(
        &self,
        ids: &[TransactionId],
    ) -> ConsensusResult<Vec<Transaction>> {
        Ok(self.mempool.get_transactions_by_ids(&*self.store, ids)?)
    }

    /// The scrambled node order of the current cycle, rebuilt lazily after a
    /// rollback.
    pub fn scrambled_nodes(&self) -> ConsensusResult<Option<ScrambledNodes>> {
        if let Some(nodes) = self.scrambled.read().clone() {
            return Ok(Some(nodes));
        }
        let Some(tip) = self.store.last_block()? else {
            return Ok(None);
        };
        let cycle = self.config.scramble_cycle.max(1);
        let height = tip.height - tip.height % cycle;
        let Some(seed_block) = self.store.block_by_height(height)? else {
            return Ok(None);
        };
        let nodes = scrambled_order(&*self.store, &seed_block)?;
        *self.scrambled.write() = Some(nodes.clone());
        Ok(Some(nodes))
    }

    /// Counts a rejection and logs it.
    fn rejected(&self, block_id: BlockId, block_height: u64, error: &ConsensusError) {
        metrics::record_rejected(&error.kind().to_string());
        warn!(
            block_id,
            block_height,
            error = %error,
            "[sc-06] Block rejected"
        );
    }
}

/// Registered nodes shuffled by the seed of `block`.
pub(super) fn scrambled_order<R: LedgerRead + ?Sized>(
    ledger: &R,
    block: &Block,
) -> ConsensusResult<ScrambledNodes> {
    let mut ids: Vec<NodeId> = ledger
        .node_registrations_by_status(RegistrationStatus::Registered)?
        .iter()
        .map(|r| r.node_id)
        .collect();
    ids.sort_unstable();
    let nodes = ScrambledNodes {
        block_height: block.height,
        node_ids: scramble_nodes(&block.block_seed, &ids),
    };
    debug!(
        block_height = block.height,
        count = nodes.node_ids.len(),
        "[sc-06] Scrambled node order rebuilt"
    );
    Ok(nodes)
}
