//! # In-Memory Ledger
//!
//! Serializable in-memory implementation of [`LedgerStore`].
//!
//! - A single writer mutex serializes transactions.
//! - A transaction works on a private copy of the committed state; commit
//!   publishes it atomically, rollback discards it.
//! - Readers see the last committed snapshot and never wait on writers.

use crate::domain::errors::StoreResult;
use crate::domain::state::LedgerState;
use crate::ports::ledger::{LedgerRead, LedgerStore, LedgerTx, LedgerWrite};
use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::entities::*;
use std::sync::Arc;
use tracing::trace;

/// In-memory ledger store.
#[derive(Default)]
pub struct InMemoryLedger {
    committed: RwLock<Arc<LedgerState>>,
    writer: Mutex<()>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last committed state.
    pub fn snapshot(&self) -> Arc<LedgerState> {
        self.committed.read().clone()
    }
}

/// Transaction handle over [`InMemoryLedger`].
pub struct InMemoryLedgerTx<'a> {
    _writer: MutexGuard<'a, ()>,
    committed: &'a RwLock<Arc<LedgerState>>,
    working: LedgerState,
}

impl LedgerStore for InMemoryLedger {
    type Tx<'a> = InMemoryLedgerTx<'a>;

    fn begin(&self) -> StoreResult<InMemoryLedgerTx<'_>> {
        let writer = self.writer.lock();
        let working = LedgerState::clone(&self.committed.read());
        trace!("ledger transaction started");
        Ok(InMemoryLedgerTx {
            _writer: writer,
            committed: &self.committed,
            working,
        })
    }
}

impl LedgerTx for InMemoryLedgerTx<'_> {
    fn commit(self) -> StoreResult<()> {
        *self.committed.write() = Arc::new(self.working);
        trace!("ledger transaction committed");
        Ok(())
    }

    fn rollback(self) -> StoreResult<()> {
        trace!("ledger transaction rolled back");
        Ok(())
    }
}

macro_rules! impl_ledger_read {
    ($ty:ty, |$s:ident| $state:expr) => {
        impl LedgerRead for $ty {
            fn last_block(&self) -> StoreResult<Option<Block>> {
                let $s = self;
                Ok($state.last_block())
            }

            fn block_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
                let $s = self;
                Ok($state.block_by_height(height))
            }

            fn block_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
                let $s = self;
                Ok($state.block_by_id(id))
            }

            fn blocks_from_height(&self, height: u64, limit: usize) -> StoreResult<Vec<Block>> {
                let $s = self;
                Ok($state.blocks_from_height(height, limit))
            }

            fn transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
                let $s = self;
                Ok($state.transaction(id))
            }

            fn mempool_transaction(
                &self,
                id: TransactionId,
            ) -> StoreResult<Option<MempoolTransaction>> {
                let $s = self;
                Ok($state.mempool_transaction(id))
            }

            fn mempool_transactions(&self) -> StoreResult<Vec<MempoolTransaction>> {
                let $s = self;
                Ok($state.mempool_transactions())
            }

            fn mempool_count(&self) -> StoreResult<usize> {
                let $s = self;
                Ok($state.mempool_count())
            }

            fn account_balance(
                &self,
                address: &AccountAddress,
            ) -> StoreResult<Option<AccountBalance>> {
                let $s = self;
                Ok($state.account_balance(address))
            }

            fn node_registration(&self, node_id: NodeId) -> StoreResult<Option<NodeRegistration>> {
                let $s = self;
                Ok($state.node_registration(node_id))
            }

            fn node_registration_by_public_key(
                &self,
                node_public_key: &PublicKey,
            ) -> StoreResult<Option<NodeRegistration>> {
                let $s = self;
                Ok($state.node_registration_by_public_key(node_public_key))
            }

            fn node_registration_by_account(
                &self,
                account: &AccountAddress,
            ) -> StoreResult<Option<NodeRegistration>> {
                let $s = self;
                Ok($state.node_registration_by_account(account))
            }

            fn node_registrations_by_status(
                &self,
                status: RegistrationStatus,
            ) -> StoreResult<Vec<NodeRegistration>> {
                let $s = self;
                Ok($state.node_registrations_by_status(status))
            }

            fn participation_score(
                &self,
                node_id: NodeId,
            ) -> StoreResult<Option<ParticipationScore>> {
                let $s = self;
                Ok($state.participation_score(node_id))
            }

            fn skipped_blocksmiths_at(&self, height: u64) -> StoreResult<Vec<SkippedBlocksmith>> {
                let $s = self;
                Ok($state.skipped_blocksmiths_at(height))
            }

            fn published_receipts_at(&self, height: u64) -> StoreResult<Vec<PublishedReceipt>> {
                let $s = self;
                Ok($state.published_receipts_at(height))
            }
        }
    };
}

impl_ledger_read!(InMemoryLedger, |s| s.committed.read());
impl_ledger_read!(InMemoryLedgerTx<'_>, |s| s.working);

impl LedgerWrite for InMemoryLedgerTx<'_> {
    fn insert_block(&mut self, block: &Block) -> StoreResult<()> {
        self.working.insert_block(block)
    }

    fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        self.working.insert_transaction(tx)
    }

    fn insert_mempool_transaction(&mut self, entry: &MempoolTransaction) -> StoreResult<()> {
        self.working.insert_mempool_transaction(entry)
    }

    fn remove_mempool_transactions(&mut self, ids: &[TransactionId]) -> StoreResult<()> {
        self.working.remove_mempool_transactions(ids);
        Ok(())
    }

    fn add_spendable_balance(&mut self, address: &AccountAddress, delta: i64) -> StoreResult<()> {
        self.working.add_spendable_balance(address, delta);
        Ok(())
    }

    fn add_account_balance(
        &mut self,
        address: &AccountAddress,
        balance_delta: i64,
        spendable_delta: i64,
        pop_revenue_delta: i64,
        height: u64,
    ) -> StoreResult<()> {
        self.working.add_account_balance(
            address,
            balance_delta,
            spendable_delta,
            pop_revenue_delta,
            height,
        );
        Ok(())
    }

    fn put_node_registration(&mut self, registration: &NodeRegistration) -> StoreResult<()> {
        self.working.put_node_registration(registration);
        Ok(())
    }

    fn put_participation_score(&mut self, score: &ParticipationScore) -> StoreResult<()> {
        self.working.put_participation_score(score);
        Ok(())
    }

    fn insert_skipped_blocksmith(&mut self, skipped: &SkippedBlocksmith) -> StoreResult<()> {
        self.working.insert_skipped_blocksmith(skipped);
        Ok(())
    }

    fn insert_published_receipt(&mut self, receipt: &PublishedReceipt) -> StoreResult<()> {
        self.working.insert_published_receipt(receipt);
        Ok(())
    }

    fn rollback_to_height(&mut self, height: u64) -> StoreResult<()> {
        self.working.rollback_to_height(height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> MempoolTransaction {
        MempoolTransaction {
            id,
            fee_per_byte: 1,
            arrival_timestamp: 100,
            transaction_bytes: vec![0; 8],
            sender_account_address: [1; 32],
            recipient_account_address: Some([2; 32]),
            block_height: 0,
        }
    }

    #[test]
    fn test_commit_publishes_state() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().unwrap();
        tx.insert_mempool_transaction(&entry(1)).unwrap();
        assert_eq!(tx.mempool_count().unwrap(), 1);
        assert_eq!(ledger.mempool_count().unwrap(), 0);
        tx.commit().unwrap();
        assert_eq!(ledger.mempool_count().unwrap(), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let ledger = InMemoryLedger::new();
        {
            let mut tx = ledger.begin().unwrap();
            tx.add_spendable_balance(&[3; 32], 50).unwrap();
        }
        assert!(ledger.account_balance(&[3; 32]).unwrap().is_none());

        let mut tx = ledger.begin().unwrap();
        tx.insert_mempool_transaction(&entry(4)).unwrap();
        tx.rollback().unwrap();
        assert!(ledger.mempool_transaction(4).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_admission_within_one_transaction() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().unwrap();
        tx.insert_mempool_transaction(&entry(7)).unwrap();
        let err = tx.insert_mempool_transaction(&entry(7)).unwrap_err();
        assert_eq!(err.kind(), shared_types::ErrorKind::Duplicate);
    }

    #[test]
    fn test_writers_are_serialized() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = ledger.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    let mut tx = ledger.begin().unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    tx.insert_mempool_transaction(&entry(i)).unwrap();
                    inside.fetch_sub(1, Ordering::SeqCst);
                    tx.commit().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.mempool_count().unwrap(), 4);
    }
}
