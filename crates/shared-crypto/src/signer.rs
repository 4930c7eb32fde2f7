//! # Node Signer Port
//!
//! Signing and verification as seen by the consensus core. Blocks, block
//! seeds and receipts are signed with the node key; transactions and blocks
//! are verified against the claimed public key.

use crate::signatures::{Ed25519KeyPair, Ed25519PublicKey};
use tracing::trace;

/// Signs payloads with a node seed and verifies node signatures.
pub trait NodeSigner: Send + Sync {
    /// Public key derived from `node_seed`.
    fn public_key_from_seed(&self, node_seed: &[u8; 32]) -> [u8; 32];

    /// Signs `payload` with the key derived from `node_seed`.
    fn sign_by_node(&self, payload: &[u8], node_seed: &[u8; 32]) -> [u8; 64];

    /// Returns true when `signature` over `payload` verifies for `public_key`.
    fn verify_node_signature(
        &self,
        payload: &[u8],
        signature: &[u8; 64],
        public_key: &[u8; 32],
    ) -> bool;
}

/// Ed25519-backed [`NodeSigner`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519NodeSigner;

impl Ed25519NodeSigner {
    pub fn new() -> Self {
        Self
    }
}

impl NodeSigner for Ed25519NodeSigner {
    fn public_key_from_seed(&self, node_seed: &[u8; 32]) -> [u8; 32] {
        *Ed25519KeyPair::from_seed(*node_seed).public_key().as_bytes()
    }

    fn sign_by_node(&self, payload: &[u8], node_seed: &[u8; 32]) -> [u8; 64] {
        Ed25519KeyPair::from_seed(*node_seed).sign(payload)
    }

    fn verify_node_signature(
        &self,
        payload: &[u8],
        signature: &[u8; 64],
        public_key: &[u8; 32],
    ) -> bool {
        match Ed25519PublicKey::from_bytes(*public_key) {
            Ok(key) => key.verify(payload, signature).is_ok(),
            Err(err) => {
                trace!(error = %err, "rejecting signature for malformed public key");
                false
            }
        }
    }
}
