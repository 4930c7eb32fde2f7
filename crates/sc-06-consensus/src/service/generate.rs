//! Block generation and genesis.

use super::validation::block_totals;
use super::{BlockService, PushMode, PushOutcome};
use crate::domain::{build_genesis_block, ConsensusError, ConsensusResult, GenesisConfig};
use crate::ports::BlocksmithStrategy;
use primitive_types::U256;
use sc_01_ledger_store::{LedgerRead, LedgerStore};
use shared_types::codec::{compute_payload, sha3_256};
use shared_types::entities::*;
use tracing::{debug, info};

const BLOCK_VERSION: u32 = 1;

impl<S: LedgerStore, B: BlocksmithStrategy> BlockService<S, B> {
    /// Builds and signs the successor of `previous` from mempool
    /// transactions, smithed by the node owning `node_seed`.
    pub fn generate_block(
        &self,
        previous: &Block,
        node_seed: &[u8; 32],
        timestamp: Timestamp,
    ) -> ConsensusResult<Block> {
        let transactions = self.mempool.select_for_block(&*self.store, timestamp)?;
        let (payload_hash, payload_length) = compute_payload(&transactions, &[])?;
        let (total_amount, total_fee) = block_totals(&transactions)?;
        let seed_signature = self.signer.sign_by_node(&previous.block_seed, node_seed);

        let mut block = Block {
            id: 0,
            block_hash: [0; 32],
            previous_block_hash: previous.block_hash,
            height: previous.height + 1,
            timestamp,
            block_seed: sha3_256(&seed_signature),
            block_signature: EMPTY_SIGNATURE,
            cumulative_difficulty: U256::zero(),
            blocksmith_public_key: self.signer.public_key_from_seed(node_seed),
            total_amount,
            total_fee,
            total_coinbase: self.config.coinbase,
            version: BLOCK_VERSION,
            payload_length,
            payload_hash,
            transactions,
            published_receipts: Vec::new(),
            transaction_ids: Vec::new(),
        };
        let signature = self.signer.sign_by_node(&block.unsigned_bytes()?, node_seed);
        block.seal(signature)?;
        debug!(
            block_height = block.height,
            transactions = block.transactions.len(),
            "[sc-06] Block generated"
        );
        Ok(block)
    }

    /// Smiths and pushes a block if the node owning `node_seed` is eligible
    /// and its smith time has come.
    pub fn try_produce(&self, node_seed: &[u8; 32]) -> ConsensusResult<Option<PushOutcome>> {
        let previous = self.last_block()?;
        let public_key = self.signer.public_key_from_seed(node_seed);
        let map = self.strategy.sorted_blocksmiths_map(&*self.store, &previous)?;
        let Some(&index) = map.get(&public_key) else {
            return Ok(None);
        };
        let now = self.time.now();
        if now < self.strategy.smith_time(index, &previous) || self.block_pool.get(index).is_some() {
            return Ok(None);
        }

        let block = self.generate_block(&previous, node_seed, now)?;
        self.push_block(&previous, block, true).map(Some)
    }

    /// Pushes the genesis block built from `config` into empty storage.
    ///
    /// Returns `None` when the same genesis block is already stored.
    pub fn add_genesis(&self, config: &GenesisConfig) -> ConsensusResult<Option<Block>> {
        let genesis = build_genesis_block(config)?;
        let chain = self.chain_lock.write();
        if let Some(existing) = self.store.block_by_height(0)? {
            if existing.id != genesis.id {
                return Err(ConsensusError::GenesisMismatch);
            }
            return Ok(None);
        }

        match self.push_locked(&chain, None, genesis, false, PushMode::FirstPush)? {
            PushOutcome::Pushed(block) => {
                info!(block_id = block.id, "[sc-06] Genesis block added");
                Ok(Some(block))
            }
            PushOutcome::Pooled { .. } => Ok(None),
        }
    }

    /// Whether the stored genesis block is the one `config` describes.
    pub fn check_genesis(&self, config: &GenesisConfig) -> ConsensusResult<bool> {
        let genesis = build_genesis_block(config)?;
        Ok(self
            .store
            .block_by_height(0)?
            .map_or(false, |stored| stored.id == genesis.id))
    }
}
