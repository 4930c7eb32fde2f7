//! # Subsystem Container
//!
//! Builds every subsystem in dependency order and holds the shared handles.
//!
//! ## Initialization Order
//!
//! 1. Shared infrastructure: clock, event bus, signer, ledger, key-value store
//! 2. Mempool and its receipt service
//! 3. Incomplete-block queue and block pool
//! 4. Blocksmith strategy and block service

pub mod config;

pub use config::{ConfigError, NodeConfig, WorkerConfig};

use sc_01_ledger_store::{InMemoryKVStore, InMemoryLedger, SystemTimeSource, TimeSource};
use sc_03_mempool::{MempoolService, ReceiptService};
use sc_04_incomplete_queue::BlockIncompleteQueue;
use sc_05_block_pool::InMemoryBlockPool;
use sc_06_consensus::{
    BlockService, BlockServiceDependencies, ConsensusResult, NoHoldExpiry,
    RegistryBlocksmithStrategy, StoringReceiptProcessor,
};
use shared_bus::InMemoryEventBus;
use shared_crypto::{Ed25519NodeSigner, NodeSigner};
use shared_types::{Block, PublicKey};
use std::sync::Arc;
use tracing::info;

/// The block service over the in-memory ledger.
pub type ChainService = BlockService<InMemoryLedger, RegistryBlocksmithStrategy>;

/// Container holding all initialized subsystems.
pub struct SubsystemContainer {
    pub config: NodeConfig,
    pub ledger: Arc<InMemoryLedger>,
    pub kv: Arc<InMemoryKVStore>,
    pub event_bus: Arc<InMemoryEventBus>,
    pub time: Arc<dyn TimeSource>,
    pub signer: Arc<dyn NodeSigner>,
    pub mempool: Arc<MempoolService<InMemoryLedger>>,
    pub incomplete_queue: Arc<BlockIncompleteQueue>,
    pub block_pool: Arc<InMemoryBlockPool>,
    pub block_service: Arc<ChainService>,
}

impl SubsystemContainer {
    /// Wire every subsystem against the system clock.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Wire every subsystem against `time`.
    pub fn with_time_source(config: NodeConfig, time: Arc<dyn TimeSource>) -> Self {
        let event_bus = Arc::new(InMemoryEventBus::new());
        let signer: Arc<dyn NodeSigner> = Arc::new(Ed25519NodeSigner::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let kv = Arc::new(InMemoryKVStore::new(Arc::clone(&time)));

        let receipts = Arc::new(ReceiptService::new(
            kv.clone(),
            Arc::clone(&signer),
            config.node_seed,
            config.mempool.receipt_reminder_ttl,
        ));
        let mempool = Arc::new(MempoolService::new(
            config.mempool.clone(),
            Arc::clone(&ledger),
            kv.clone(),
            Arc::clone(&signer),
            event_bus.clone(),
            Arc::clone(&time),
            receipts,
        ));

        let incomplete_queue = Arc::new(BlockIncompleteQueue::new(
            config.incomplete_queue,
            Arc::clone(&time),
            event_bus.clone(),
        ));
        let block_pool = Arc::new(InMemoryBlockPool::new());

        let block_service = Arc::new(BlockService::new(BlockServiceDependencies {
            store: Arc::clone(&ledger),
            strategy: Arc::new(RegistryBlocksmithStrategy::new(&config.consensus)),
            mempool: Arc::clone(&mempool),
            incomplete_queue: Arc::clone(&incomplete_queue),
            block_pool: block_pool.clone(),
            signer: Arc::clone(&signer),
            publisher: event_bus.clone(),
            receipt_processor: Arc::new(StoringReceiptProcessor::new(Arc::clone(&signer))),
            hold_expiry: Arc::new(NoHoldExpiry),
            time: Arc::clone(&time),
            config: config.consensus.clone(),
        }));

        info!("Subsystems wired");
        Self {
            config,
            ledger,
            kv,
            event_bus,
            time,
            signer,
            mempool,
            incomplete_queue,
            block_pool,
            block_service,
        }
    }

    /// Public key of this node's signing key.
    pub fn node_public_key(&self) -> PublicKey {
        self.signer.public_key_from_seed(&self.config.node_seed)
    }

    /// Push the configured genesis block into empty storage and return the
    /// chain tip.
    pub fn bootstrap_genesis(&self) -> ConsensusResult<Block> {
        match self.block_service.add_genesis(&self.config.genesis)? {
            Some(genesis) => info!(block_id = genesis.id, "Genesis block created"),
            None => info!("Genesis block found, chain initialized"),
        }
        self.block_service.last_block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_01_ledger_store::ManualTimeSource;
    use sc_06_consensus::ConsensusError;

    fn container() -> SubsystemContainer {
        SubsystemContainer::with_time_source(
            NodeConfig::development([3; 32]),
            Arc::new(ManualTimeSource::new(1_704_067_200)),
        )
    }

    #[test]
    fn test_bootstrap_genesis_is_idempotent() {
        let container = container();
        let first = container.bootstrap_genesis().unwrap();
        let second = container.bootstrap_genesis().unwrap();
        assert_eq!(first.height, 0);
        assert_eq!(first.id, second.id);
        assert!(container
            .block_service
            .check_genesis(&container.config.genesis)
            .unwrap());
    }

    #[test]
    fn test_foreign_genesis_rejected() {
        let container = container();
        container.bootstrap_genesis().unwrap();
        let foreign = NodeConfig::development([4; 32]).genesis;
        assert_eq!(
            container.block_service.add_genesis(&foreign).unwrap_err(),
            ConsensusError::GenesisMismatch
        );
    }

    #[test]
    fn test_node_public_key_matches_genesis_node() {
        let container = container();
        assert_eq!(
            container.node_public_key(),
            container.config.genesis.nodes[0].node_public_key
        );
    }
}
