//! # Ledger Ports
//!
//! The storage collaborator as seen by the chain core.
//!
//! Writes are only reachable through a [`LedgerTx`] handle obtained from
//! [`LedgerStore::begin`], so every mutation happens inside a transaction by
//! construction. Reads are available both on the store (committed state)
//! and on the handle (the transaction's own view).

use crate::domain::errors::StoreResult;
use shared_types::entities::*;

/// Read access to ledger tables.
pub trait LedgerRead {
    /// Tip of the chain, `None` before genesis.
    fn last_block(&self) -> StoreResult<Option<Block>>;

    fn block_by_height(&self, height: u64) -> StoreResult<Option<Block>>;

    fn block_by_id(&self, id: BlockId) -> StoreResult<Option<Block>>;

    /// Up to `limit` blocks starting at `height`, ascending.
    fn blocks_from_height(&self, height: u64, limit: usize) -> StoreResult<Vec<Block>>;

    /// Confirmed transaction by ID.
    fn transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>>;

    fn mempool_transaction(&self, id: TransactionId) -> StoreResult<Option<MempoolTransaction>>;

    /// Every mempool entry in storage order (ascending ID).
    fn mempool_transactions(&self) -> StoreResult<Vec<MempoolTransaction>>;

    fn mempool_count(&self) -> StoreResult<usize>;

    /// Balance including unconfirmed spendable adjustments.
    fn account_balance(&self, address: &AccountAddress) -> StoreResult<Option<AccountBalance>>;

    fn node_registration(&self, node_id: NodeId) -> StoreResult<Option<NodeRegistration>>;

    fn node_registration_by_public_key(
        &self,
        node_public_key: &PublicKey,
    ) -> StoreResult<Option<NodeRegistration>>;

    /// Live (not deleted) registration owned by `account`.
    fn node_registration_by_account(
        &self,
        account: &AccountAddress,
    ) -> StoreResult<Option<NodeRegistration>>;

    fn node_registrations_by_status(
        &self,
        status: RegistrationStatus,
    ) -> StoreResult<Vec<NodeRegistration>>;

    fn participation_score(&self, node_id: NodeId) -> StoreResult<Option<ParticipationScore>>;

    fn skipped_blocksmiths_at(&self, height: u64) -> StoreResult<Vec<SkippedBlocksmith>>;

    fn published_receipts_at(&self, height: u64) -> StoreResult<Vec<PublishedReceipt>>;
}

/// Mutations, available only inside a transaction.
pub trait LedgerWrite: LedgerRead {
    /// Fails with `UniqueViolation` when the height or ID is taken.
    fn insert_block(&mut self, block: &Block) -> StoreResult<()>;

    /// Fails with `UniqueViolation` when the ID is already confirmed.
    fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()>;

    /// Fails with `UniqueViolation` when the ID is already pending.
    fn insert_mempool_transaction(&mut self, entry: &MempoolTransaction) -> StoreResult<()>;

    fn remove_mempool_transactions(&mut self, ids: &[TransactionId]) -> StoreResult<()>;

    /// Unconfirmed adjustment of the spendable balance.
    fn add_spendable_balance(&mut self, address: &AccountAddress, delta: i64) -> StoreResult<()>;

    /// Confirmed adjustment, versioned at `height`.
    fn add_account_balance(
        &mut self,
        address: &AccountAddress,
        balance_delta: i64,
        spendable_delta: i64,
        pop_revenue_delta: i64,
        height: u64,
    ) -> StoreResult<()>;

    /// Writes a registration version at `registration.height`.
    fn put_node_registration(&mut self, registration: &NodeRegistration) -> StoreResult<()>;

    /// Writes a score version at `score.height`.
    fn put_participation_score(&mut self, score: &ParticipationScore) -> StoreResult<()>;

    fn insert_skipped_blocksmith(&mut self, skipped: &SkippedBlocksmith) -> StoreResult<()>;

    fn insert_published_receipt(&mut self, receipt: &PublishedReceipt) -> StoreResult<()>;

    /// Removes everything recorded above `height` from every table.
    fn rollback_to_height(&mut self, height: u64) -> StoreResult<()>;
}

/// A storage transaction. Dropping it without `commit` rolls it back.
pub trait LedgerTx: LedgerWrite {
    fn commit(self) -> StoreResult<()>;

    fn rollback(self) -> StoreResult<()>;
}

/// Entry point of the storage collaborator.
pub trait LedgerStore: LedgerRead + Send + Sync {
    type Tx<'a>: LedgerTx
    where
        Self: 'a;

    /// Starts a transaction. Write transactions are serialized: this blocks
    /// while another transaction is open.
    fn begin(&self) -> StoreResult<Self::Tx<'_>>;
}
