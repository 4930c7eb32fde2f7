//! # Block Pool (sc-05)
//!
//! Holds fully valid blocks whose blocksmith's persist window has not
//! opened yet, keyed by blocksmith index.
//!
//! - At most one block per index; inserting again replaces the entry.
//! - Cleared whenever a block is pushed canonically or the chain rolls back.

use parking_lot::RwLock;
use shared_types::Block;
use std::collections::BTreeMap;
use tracing::debug;

/// Block pool interface as seen by the block service.
pub trait BlockPool: Send + Sync {
    /// Stores `block` for `blocksmith_index`, replacing any earlier candidate.
    fn insert(&self, block: Block, blocksmith_index: u32);

    fn get(&self, blocksmith_index: u32) -> Option<Block>;

    /// Every pooled block by index, ascending.
    fn get_all(&self) -> BTreeMap<u32, Block>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process block pool.
#[derive(Debug, Default)]
pub struct InMemoryBlockPool {
    blocks: RwLock<BTreeMap<u32, Block>>,
}

impl InMemoryBlockPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockPool for InMemoryBlockPool {
    fn insert(&self, block: Block, blocksmith_index: u32) {
        debug!(
            block_id = block.id,
            block_height = block.height,
            blocksmith_index,
            "[sc-05] Block pooled"
        );
        self.blocks.write().insert(blocksmith_index, block);
    }

    fn get(&self, blocksmith_index: u32) -> Option<Block> {
        self.blocks.read().get(&blocksmith_index).cloned()
    }

    fn get_all(&self) -> BTreeMap<u32, Block> {
        self.blocks.read().clone()
    }

    fn clear(&self) {
        let mut blocks = self.blocks.write();
        if !blocks.is_empty() {
            debug!(count = blocks.len(), "[sc-05] Block pool cleared");
        }
        blocks.clear();
    }

    fn len(&self) -> usize {
        self.blocks.read().len()
    }
}
