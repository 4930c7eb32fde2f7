//! # Ledger State
//!
//! The in-memory image of every table the chain core persists.
//!
//! Tables that evolve with the chain (balances, node registrations,
//! participation scores) are versioned by block height so that a rollback
//! truncates them back to any retained height. Unconfirmed spendable
//! adjustments live in their own unversioned table: they belong to the
//! mempool, not to a block, and must survive rollbacks of blocks below them.

use crate::domain::errors::{StoreError, StoreResult};
use shared_types::entities::*;
use std::collections::BTreeMap;

// =============================================================================
// VERSIONED TABLE
// =============================================================================

/// A table keeping one row version per height at which the row changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedTable<K: Ord, V> {
    rows: BTreeMap<K, Vec<(u64, V)>>,
}

impl<K: Ord, V> Default for VersionedTable<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> VersionedTable<K, V> {
    /// Latest version of `key`.
    pub fn latest(&self, key: &K) -> Option<&V> {
        self.rows
            .get(key)
            .and_then(|history| history.last())
            .map(|(_, v)| v)
    }

    /// Writes `value` as the version at `height`, replacing a version
    /// already recorded at that height.
    pub fn put(&mut self, key: K, height: u64, value: V) {
        let history = self.rows.entry(key).or_default();
        match history.last_mut() {
            Some((h, v)) if *h == height => *v = value,
            _ => history.push((height, value)),
        }
    }

    /// Drops every version above `height`.
    pub fn rollback_to(&mut self, height: u64) {
        self.rows.retain(|_, history| {
            history.retain(|(h, _)| *h <= height);
            !history.is_empty()
        });
    }

    /// Latest version of every key, in key order.
    pub fn iter_latest(&self) -> impl Iterator<Item = (&K, &V)> {
        self.rows
            .iter()
            .filter_map(|(k, history)| history.last().map(|(_, v)| (k, v)))
    }

    /// Number of versions recorded for `key`.
    pub fn version_count(&self, key: &K) -> usize {
        self.rows.get(key).map_or(0, Vec::len)
    }
}

// =============================================================================
// LEDGER STATE
// =============================================================================

/// Every table of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    /// Block headers by height, transaction bodies stripped.
    blocks: BTreeMap<u64, Block>,
    block_heights: BTreeMap<BlockId, u64>,
    transactions: BTreeMap<TransactionId, Transaction>,
    mempool: BTreeMap<TransactionId, MempoolTransaction>,
    balances: VersionedTable<AccountAddress, AccountBalance>,
    unconfirmed_spendable: BTreeMap<AccountAddress, i64>,
    node_registrations: VersionedTable<NodeId, NodeRegistration>,
    participation_scores: VersionedTable<NodeId, ParticipationScore>,
    skipped_blocksmiths: Vec<SkippedBlocksmith>,
    published_receipts: Vec<PublishedReceipt>,
}

impl LedgerState {
    // -------------------------------------------------------------------------
    // Blocks
    // -------------------------------------------------------------------------

    fn with_transactions(&self, header: &Block) -> Block {
        let mut block = header.clone();
        let mut txs: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.block_id == Some(header.id))
            .cloned()
            .collect();
        txs.sort_by_key(|tx| tx.transaction_index);
        block.transactions = txs;
        block
    }

    pub fn last_block(&self) -> Option<Block> {
        self.blocks
            .values()
            .next_back()
            .map(|header| self.with_transactions(header))
    }

    pub fn block_by_height(&self, height: u64) -> Option<Block> {
        self.blocks
            .get(&height)
            .map(|header| self.with_transactions(header))
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<Block> {
        self.block_heights
            .get(&id)
            .and_then(|h| self.block_by_height(*h))
    }

    pub fn blocks_from_height(&self, height: u64, limit: usize) -> Vec<Block> {
        self.blocks
            .range(height..)
            .take(limit)
            .map(|(_, header)| self.with_transactions(header))
            .collect()
    }

    pub fn insert_block(&mut self, block: &Block) -> StoreResult<()> {
        if self.blocks.contains_key(&block.height) {
            return Err(StoreError::UniqueViolation {
                table: "block",
                key: format!("height {}", block.height),
            });
        }
        if self.block_heights.contains_key(&block.id) {
            return Err(StoreError::UniqueViolation {
                table: "block",
                key: format!("id {}", block.id),
            });
        }
        let mut header = block.clone();
        header.transaction_ids.clear();
        header.transactions.clear();
        header.published_receipts.clear();
        self.block_heights.insert(block.id, block.height);
        self.blocks.insert(block.height, header);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&id).cloned()
    }

    pub fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        if self.transactions.contains_key(&tx.id) {
            return Err(StoreError::UniqueViolation {
                table: "transaction",
                key: tx.id.to_string(),
            });
        }
        self.transactions.insert(tx.id, tx.clone());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Mempool
    // -------------------------------------------------------------------------

    pub fn mempool_transaction(&self, id: TransactionId) -> Option<MempoolTransaction> {
        self.mempool.get(&id).cloned()
    }

    pub fn mempool_transactions(&self) -> Vec<MempoolTransaction> {
        self.mempool.values().cloned().collect()
    }

    pub fn mempool_count(&self) -> usize {
        self.mempool.len()
    }

    pub fn insert_mempool_transaction(&mut self, entry: &MempoolTransaction) -> StoreResult<()> {
        if self.mempool.contains_key(&entry.id) {
            return Err(StoreError::UniqueViolation {
                table: "mempool",
                key: entry.id.to_string(),
            });
        }
        self.mempool.insert(entry.id, entry.clone());
        Ok(())
    }

    pub fn remove_mempool_transactions(&mut self, ids: &[TransactionId]) {
        for id in ids {
            self.mempool.remove(id);
        }
    }

    // -------------------------------------------------------------------------
    // Balances
    // -------------------------------------------------------------------------

    pub fn account_balance(&self, address: &AccountAddress) -> Option<AccountBalance> {
        let pending = self.unconfirmed_spendable.get(address).copied();
        match (self.balances.latest(address), pending) {
            (None, None) => None,
            (Some(b), None) => Some(*b),
            (latest, Some(delta)) => {
                let mut balance = latest
                    .copied()
                    .unwrap_or_else(|| AccountBalance::empty(*address, 0));
                balance.spendable_balance += delta;
                Some(balance)
            }
        }
    }

    pub fn add_spendable_balance(&mut self, address: &AccountAddress, delta: i64) {
        let entry = self.unconfirmed_spendable.entry(*address).or_insert(0);
        *entry += delta;
        if *entry == 0 {
            self.unconfirmed_spendable.remove(address);
        }
    }

    pub fn add_account_balance(
        &mut self,
        address: &AccountAddress,
        balance_delta: i64,
        spendable_delta: i64,
        pop_revenue_delta: i64,
        height: u64,
    ) {
        let mut row = self
            .balances
            .latest(address)
            .copied()
            .unwrap_or_else(|| AccountBalance::empty(*address, height));
        row.balance += balance_delta;
        row.spendable_balance += spendable_delta;
        row.pop_revenue += pop_revenue_delta;
        row.block_height = height;
        self.balances.put(*address, height, row);
    }

    // -------------------------------------------------------------------------
    // Node registry and scores
    // -------------------------------------------------------------------------

    pub fn node_registration(&self, node_id: NodeId) -> Option<NodeRegistration> {
        self.node_registrations.latest(&node_id).cloned()
    }

    pub fn node_registration_by_public_key(
        &self,
        node_public_key: &PublicKey,
    ) -> Option<NodeRegistration> {
        self.node_registrations
            .iter_latest()
            .map(|(_, r)| r)
            .find(|r| &r.node_public_key == node_public_key)
            .cloned()
    }

    pub fn node_registration_by_account(
        &self,
        account: &AccountAddress,
    ) -> Option<NodeRegistration> {
        self.node_registrations
            .iter_latest()
            .map(|(_, r)| r)
            .find(|r| &r.account_address == account && r.registration_status != RegistrationStatus::Deleted)
            .cloned()
    }

    pub fn node_registrations_by_status(&self, status: RegistrationStatus) -> Vec<NodeRegistration> {
        self.node_registrations
            .iter_latest()
            .map(|(_, r)| r)
            .filter(|r| r.registration_status == status)
            .cloned()
            .collect()
    }

    pub fn put_node_registration(&mut self, registration: &NodeRegistration) {
        self.node_registrations
            .put(registration.node_id, registration.height, registration.clone());
    }

    pub fn participation_score(&self, node_id: NodeId) -> Option<ParticipationScore> {
        self.participation_scores.latest(&node_id).copied()
    }

    pub fn put_participation_score(&mut self, score: &ParticipationScore) {
        self.participation_scores
            .put(score.node_id, score.height, *score);
    }

    // -------------------------------------------------------------------------
    // Skipped blocksmiths and receipts
    // -------------------------------------------------------------------------

    pub fn insert_skipped_blocksmith(&mut self, skipped: &SkippedBlocksmith) {
        self.skipped_blocksmiths.push(*skipped);
    }

    pub fn skipped_blocksmiths_at(&self, height: u64) -> Vec<SkippedBlocksmith> {
        self.skipped_blocksmiths
            .iter()
            .filter(|s| s.block_height == height)
            .copied()
            .collect()
    }

    pub fn insert_published_receipt(&mut self, receipt: &PublishedReceipt) {
        self.published_receipts.push(receipt.clone());
    }

    pub fn published_receipts_at(&self, height: u64) -> Vec<PublishedReceipt> {
        let mut receipts: Vec<PublishedReceipt> = self
            .published_receipts
            .iter()
            .filter(|r| r.block_height == height)
            .cloned()
            .collect();
        receipts.sort_by_key(|r| r.published_index);
        receipts
    }

    // -------------------------------------------------------------------------
    // Rollback
    // -------------------------------------------------------------------------

    /// Removes everything recorded above `height` from every table.
    pub fn rollback_to_height(&mut self, height: u64) {
        let removed: Vec<u64> = self
            .blocks
            .range(height.saturating_add(1)..)
            .map(|(h, _)| *h)
            .collect();
        for h in removed {
            if let Some(block) = self.blocks.remove(&h) {
                self.block_heights.remove(&block.id);
            }
        }
        self.transactions
            .retain(|_, tx| tx.height.map_or(true, |h| h <= height));
        self.mempool.retain(|_, entry| entry.block_height <= height);
        self.balances.rollback_to(height);
        self.node_registrations.rollback_to(height);
        self.participation_scores.rollback_to(height);
        self.skipped_blocksmiths.retain(|s| s.block_height <= height);
        self.published_receipts.retain(|r| r.block_height <= height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_put_and_rollback() {
        let mut table: VersionedTable<u64, i64> = VersionedTable::default();
        table.put(1, 0, 10);
        table.put(1, 5, 20);
        table.put(1, 5, 25);
        table.put(2, 7, 1);

        assert_eq!(table.latest(&1), Some(&25));
        assert_eq!(table.version_count(&1), 2);

        table.rollback_to(5);
        assert_eq!(table.latest(&1), Some(&25));
        assert_eq!(table.latest(&2), None);

        table.rollback_to(0);
        assert_eq!(table.latest(&1), Some(&10));
    }

    #[test]
    fn test_unconfirmed_spendable_survives_rollback() {
        let mut state = LedgerState::default();
        let account = [1u8; 32];
        state.add_account_balance(&account, 100, 100, 0, 0);
        state.add_account_balance(&account, 50, 50, 0, 3);
        state.add_spendable_balance(&account, -30);

        let balance = state.account_balance(&account).unwrap();
        assert_eq!(balance.balance, 150);
        assert_eq!(balance.spendable_balance, 120);

        state.rollback_to_height(1);
        let balance = state.account_balance(&account).unwrap();
        assert_eq!(balance.balance, 100);
        assert_eq!(balance.spendable_balance, 70);

        state.add_spendable_balance(&account, 30);
        assert_eq!(state.account_balance(&account).unwrap().spendable_balance, 100);
    }

    #[test]
    fn test_mempool_unique_key() {
        let mut state = LedgerState::default();
        let entry = MempoolTransaction {
            id: 9,
            fee_per_byte: 1,
            arrival_timestamp: 1,
            transaction_bytes: vec![1, 2, 3],
            sender_account_address: [1; 32],
            recipient_account_address: None,
            block_height: 0,
        };
        state.insert_mempool_transaction(&entry).unwrap();
        assert!(matches!(
            state.insert_mempool_transaction(&entry),
            Err(StoreError::UniqueViolation { table: "mempool", .. })
        ));
        assert_eq!(state.mempool_count(), 1);
    }
}
