//! # Scrambled Node Order
//!
//! A seed-derived permutation of the registered nodes, rebuilt every
//! scramble cycle and used for peer selection.

use shared_types::codec::sha3_256;
use shared_types::{Hash, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrambledNodes {
    /// Height of the block whose seed produced the order.
    pub block_height: u64,
    pub node_ids: Vec<NodeId>,
}

impl ScrambledNodes {
    /// Position of `node_id` in the order.
    pub fn index_of(&self, node_id: NodeId) -> Option<usize> {
        self.node_ids.iter().position(|id| *id == node_id)
    }
}

/// Orders `node_ids` by `sha3(seed || node_id)`, ties by ID.
pub fn scramble_nodes(seed: &Hash, node_ids: &[NodeId]) -> Vec<NodeId> {
    let mut keyed: Vec<(Hash, NodeId)> = node_ids
        .iter()
        .map(|id| {
            let mut input = seed.to_vec();
            input.extend_from_slice(&id.to_le_bytes());
            (sha3_256(&input), *id)
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, id)| id).collect()
}
