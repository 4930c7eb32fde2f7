//! # Receipt Service
//!
//! Issues signed batch receipts acknowledging data received from peers.
//! Each issued receipt leaves a reminder in the key-value store so the
//! same datum from the same sender is acknowledged at most once per TTL.

use crate::domain::{MempoolError, MempoolResult};
use sc_01_ledger_store::{KeyValueStore, StoreError};
use shared_crypto::NodeSigner;
use shared_types::entities::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Key prefix of receipt reminders.
pub const RECEIPT_REMINDER_PREFIX: &str = "receipt_reminder_";

pub struct ReceiptService {
    kv: Arc<dyn KeyValueStore>,
    signer: Arc<dyn NodeSigner>,
    node_seed: [u8; 32],
    node_public_key: PublicKey,
    reminder_ttl: Duration,
}

impl ReceiptService {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        signer: Arc<dyn NodeSigner>,
        node_seed: [u8; 32],
        reminder_ttl: Duration,
    ) -> Self {
        let node_public_key = signer.public_key_from_seed(&node_seed);
        Self {
            kv,
            signer,
            node_seed,
            node_public_key,
            reminder_ttl,
        }
    }

    /// Public key receipts are signed with.
    pub fn node_public_key(&self) -> PublicKey {
        self.node_public_key
    }

    fn reminder_key(datum_hash: &Hash, sender_public_key: &PublicKey) -> String {
        format!(
            "{}{}{}",
            RECEIPT_REMINDER_PREFIX,
            hex::encode(datum_hash),
            hex::encode(sender_public_key)
        )
    }

    /// Whether a receipt for this datum was already issued to `sender_public_key`.
    pub fn was_issued(&self, datum_hash: &Hash, sender_public_key: &PublicKey) -> MempoolResult<bool> {
        match self.kv.get(&Self::reminder_key(datum_hash, sender_public_key)) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(MempoolError::Store(e)),
        }
    }

    /// Signs a receipt for `datum_hash` referencing `reference_block` and
    /// records the reminder.
    pub fn issue(
        &self,
        datum_type: ReceiptDatumType,
        datum_hash: Hash,
        sender_public_key: PublicKey,
        reference_block: &Block,
    ) -> MempoolResult<BatchReceipt> {
        let mut receipt = BatchReceipt {
            sender_public_key,
            recipient_public_key: self.node_public_key,
            datum_type,
            datum_hash,
            reference_block_height: reference_block.height,
            reference_block_hash: reference_block.block_hash,
            rmr_linked: None,
            recipient_signature: EMPTY_SIGNATURE,
        };
        receipt.recipient_signature = self
            .signer
            .sign_by_node(&receipt.unsigned_bytes()?, &self.node_seed);

        self.kv.insert(
            &Self::reminder_key(&datum_hash, &sender_public_key),
            reference_block.height.to_le_bytes().to_vec(),
            Some(self.reminder_ttl),
        )?;
        debug!(
            ?datum_type,
            reference_height = reference_block.height,
            "[sc-03] Receipt issued"
        );
        Ok(receipt)
    }
}
