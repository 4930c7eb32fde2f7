//! Published receipt processing.

use crate::domain::{ConsensusError, ConsensusResult};
use crate::ports::{ReceiptCounts, ReceiptProcessor};
use sc_01_ledger_store::LedgerWrite;
use shared_crypto::NodeSigner;
use shared_types::entities::Block;
use std::sync::Arc;
use tracing::debug;

/// Verifies each published receipt and stores it with the block.
///
/// A receipt counts as linked when it carries an RMR-linked root.
pub struct StoringReceiptProcessor {
    signer: Arc<dyn NodeSigner>,
}

impl StoringReceiptProcessor {
    pub fn new(signer: Arc<dyn NodeSigner>) -> Self {
        Self { signer }
    }
}

impl ReceiptProcessor for StoringReceiptProcessor {
    fn process(
        &self,
        ledger: &mut dyn LedgerWrite,
        block: &Block,
    ) -> ConsensusResult<ReceiptCounts> {
        let mut counts = ReceiptCounts::default();
        for (index, published) in block.published_receipts.iter().enumerate() {
            let receipt = &published.batch_receipt;
            let message = receipt.unsigned_bytes()?;
            let signed = self.signer.verify_node_signature(
                &message,
                &receipt.recipient_signature,
                &receipt.recipient_public_key,
            );
            if !signed
                || published.block_height != block.height
                || published.published_index as usize != index
            {
                return Err(ConsensusError::InvalidReceipt { index });
            }

            ledger.insert_published_receipt(published)?;
            if receipt.rmr_linked.is_some() {
                counts.linked += 1;
            } else {
                counts.unlinked += 1;
            }
        }
        if !block.published_receipts.is_empty() {
            debug!(
                block_height = block.height,
                linked = counts.linked,
                unlinked = counts.unlinked,
                "[sc-06] Published receipts stored"
            );
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_01_ledger_store::{InMemoryLedger, LedgerRead, LedgerStore, LedgerTx};
    use shared_crypto::Ed25519NodeSigner;
    use shared_types::entities::*;
    use shared_types::U256;

    const NODE_SEED: [u8; 32] = [9; 32];

    fn published(signer: &Ed25519NodeSigner, height: u64, index: u32, linked: bool) -> PublishedReceipt {
        let mut receipt = BatchReceipt {
            sender_public_key: [1; 32],
            recipient_public_key: signer.public_key_from_seed(&NODE_SEED),
            datum_type: ReceiptDatumType::Transaction,
            datum_hash: [index as u8; 32],
            reference_block_height: height - 1,
            reference_block_hash: [0; 32],
            rmr_linked: linked.then_some([5; 32]),
            recipient_signature: EMPTY_SIGNATURE,
        };
        receipt.recipient_signature =
            signer.sign_by_node(&receipt.unsigned_bytes().unwrap(), &NODE_SEED);
        PublishedReceipt {
            batch_receipt: receipt,
            intermediate_hashes: Vec::new(),
            block_height: height,
            receipt_index: index,
            published_index: index,
        }
    }

    fn block_with(receipts: Vec<PublishedReceipt>) -> Block {
        Block {
            id: 1,
            block_hash: [0; 32],
            previous_block_hash: [0; 32],
            height: 4,
            timestamp: 0,
            block_seed: [0; 32],
            block_signature: EMPTY_SIGNATURE,
            cumulative_difficulty: U256::zero(),
            blocksmith_public_key: [0; 32],
            total_amount: 0,
            total_fee: 0,
            total_coinbase: 0,
            version: 1,
            payload_length: 0,
            payload_hash: [0; 32],
            transactions: Vec::new(),
            published_receipts: receipts,
            transaction_ids: Vec::new(),
        }
    }

    #[test]
    fn test_counts_and_stores_receipts() {
        let signer = Ed25519NodeSigner::new();
        let processor = StoringReceiptProcessor::new(Arc::new(signer));
        let block = block_with(vec![
            published(&signer, 4, 0, true),
            published(&signer, 4, 1, false),
            published(&signer, 4, 2, false),
        ]);

        let ledger = InMemoryLedger::new();
        let mut db = ledger.begin().unwrap();
        let counts = processor.process(&mut db, &block).unwrap();
        db.commit().unwrap();

        assert_eq!(counts, ReceiptCounts { linked: 1, unlinked: 2 });
        assert_eq!(ledger.published_receipts_at(4).unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_forged_receipt() {
        let signer = Ed25519NodeSigner::new();
        let processor = StoringReceiptProcessor::new(Arc::new(signer));
        let mut forged = published(&signer, 4, 0, false);
        forged.batch_receipt.datum_hash = [0xFF; 32];

        let ledger = InMemoryLedger::new();
        let mut db = ledger.begin().unwrap();
        let err = processor.process(&mut db, &block_with(vec![forged])).unwrap_err();
        assert_eq!(err, ConsensusError::InvalidReceipt { index: 0 });
    }

    #[test]
    fn test_rejects_receipt_for_other_height() {
        let signer = Ed25519NodeSigner::new();
        let processor = StoringReceiptProcessor::new(Arc::new(signer));

        let ledger = InMemoryLedger::new();
        let mut db = ledger.begin().unwrap();
        let err = processor
            .process(&mut db, &block_with(vec![published(&signer, 7, 0, false)]))
            .unwrap_err();
        assert_eq!(err, ConsensusError::InvalidReceipt { index: 0 });
    }
}
