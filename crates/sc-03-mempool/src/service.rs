//! # Mempool Service
//!
//! Admission, validation, block selection, expiry and rollback backups.
//!
//! Every mutation runs inside a ledger transaction together with the
//! matching unconfirmed balance effect, so a failure never leaves an
//! orphaned reservation behind.

use crate::domain::{
    block_order, decode_backup, encode_backup, fee_per_byte, MempoolConfig, MempoolError,
    MempoolResult,
};
use crate::metrics;
use crate::receipt::ReceiptService;
use sc_01_ledger_store::{
    KeyValueStore, LedgerRead, LedgerStore, LedgerTx, LedgerWrite, StoreError, TimeSource,
};
use sc_02_transactions::{BalanceView, TransactionAction};
use shared_bus::{ChainEvent, EventPublisher};
use shared_crypto::NodeSigner;
use shared_types::codec::sha3_256;
use shared_types::entities::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Key prefix of mempool backups taken during a rollback.
pub const MEMPOOL_BACKUP_PREFIX: &str = "mempool_backup_";

/// Rolls back `tx`, logging instead of propagating a rollback failure.
pub fn rollback_quietly<T: LedgerTx>(tx: T) {
    if let Err(e) = tx.rollback() {
        error!(error = %e, "[sc-03] Ledger rollback failed");
    }
}

pub struct MempoolService<S: LedgerStore> {
    config: MempoolConfig,
    store: Arc<S>,
    kv: Arc<dyn KeyValueStore>,
    signer: Arc<dyn NodeSigner>,
    publisher: Arc<dyn EventPublisher>,
    time: Arc<dyn TimeSource>,
    receipts: Arc<ReceiptService>,
}

impl<S: LedgerStore> MempoolService<S> {
    pub fn new(
        config: MempoolConfig,
        store: Arc<S>,
        kv: Arc<dyn KeyValueStore>,
        signer: Arc<dyn NodeSigner>,
        publisher: Arc<dyn EventPublisher>,
        time: Arc<dyn TimeSource>,
        receipts: Arc<ReceiptService>,
    ) -> Self {
        Self {
            config,
            store,
            kv,
            signer,
            publisher,
            time,
            receipts,
        }
    }

    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    pub fn receipts(&self) -> &Arc<ReceiptService> {
        &self.receipts
    }

    /// Number of pending entries in committed state.
    pub fn pending_count(&self) -> MempoolResult<usize> {
        Ok(self.store.mempool_count()?)
    }

    /// Inserts `entry` stamped with the current chain height.
    ///
    /// Takes the caller's transaction: the duplicate check and the insert
    /// are only race-free inside one ledger transaction.
    pub fn admit(
        &self,
        ledger: &mut dyn LedgerWrite,
        mut entry: MempoolTransaction,
    ) -> MempoolResult<MempoolTransaction> {
        if self.config.max_pool_size > 0 && ledger.mempool_count()? >= self.config.max_pool_size {
            return Err(MempoolError::PoolFull {
                capacity: self.config.max_pool_size,
            });
        }
        if ledger.transaction(entry.id)?.is_some() || ledger.mempool_transaction(entry.id)?.is_some()
        {
            return Err(MempoolError::DuplicateTransaction(entry.id));
        }
        entry.block_height = ledger.last_block()?.map(|b| b.height).unwrap_or(0);

        match ledger.insert_mempool_transaction(&entry) {
            Ok(()) => Ok(entry),
            Err(StoreError::UniqueViolation { .. }) => {
                Err(MempoolError::DuplicateTransaction(entry.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parses `raw` and runs duplicate, rule, balance and signature checks.
    pub fn validate<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        raw: &[u8],
    ) -> MempoolResult<Transaction> {
        let tx = Transaction::from_bytes(raw)?;
        if ledger.transaction(tx.id)?.is_some() || ledger.mempool_transaction(tx.id)?.is_some() {
            return Err(MempoolError::DuplicateTransaction(tx.id));
        }
        tx.validate(ledger, &*self.signer, BalanceView::Spendable)?;
        Ok(tx)
    }

    /// Validates, reserves and admits `raw` inside `ledger`.
    fn stage(&self, ledger: &mut dyn LedgerWrite, raw: &[u8]) -> MempoolResult<Transaction> {
        let tx = self.validate(&*ledger, raw)?;
        tx.apply_unconfirmed(ledger)?;
        let entry = MempoolTransaction {
            id: tx.id,
            fee_per_byte: fee_per_byte(tx.fee, raw.len()),
            arrival_timestamp: self.time.now(),
            transaction_bytes: raw.to_vec(),
            sender_account_address: tx.sender,
            recipient_account_address: tx.recipient,
            block_height: 0,
        };
        self.admit(ledger, entry)?;
        Ok(tx)
    }

    /// Handles a transaction relayed by a peer and acknowledges it with a
    /// receipt.
    ///
    /// A transaction already pending is acknowledged once per sender; a
    /// repeat fails with a duplicate error.
    pub fn receive_from_network(
        &self,
        sender_public_key: PublicKey,
        raw: &[u8],
        last_block: &Block,
    ) -> MempoolResult<BatchReceipt> {
        let tx_id = match Transaction::from_bytes(raw) {
            Ok(tx) => tx.id,
            Err(e) => {
                metrics::record_rejected(&e.kind().to_string());
                return Err(e.into());
            }
        };
        let datum_hash = sha3_256(raw);

        let mut db = self.store.begin()?;
        if db.mempool_transaction(tx_id)?.is_some() {
            rollback_quietly(db);
            if self.receipts.was_issued(&datum_hash, &sender_public_key)? {
                return Err(MempoolError::ReceiptAlreadyIssued(tx_id));
            }
            return self.receipts.issue(
                ReceiptDatumType::Transaction,
                datum_hash,
                sender_public_key,
                last_block,
            );
        }

        let tx = match self.stage(&mut db, raw) {
            Ok(tx) => tx,
            Err(e) => {
                rollback_quietly(db);
                metrics::record_rejected(&e.kind().to_string());
                debug!(tx_id, error = %e, "[sc-03] Transaction rejected");
                return Err(e);
            }
        };
        db.commit()?;

        metrics::record_admitted();
        metrics::set_mempool_size(self.store.mempool_count()?);
        debug!(tx_id, "[sc-03] Transaction admitted");
        self.publisher.publish(ChainEvent::TransactionAdded(tx));

        self.receipts.issue(
            ReceiptDatumType::Transaction,
            datum_hash,
            sender_public_key,
            last_block,
        )
    }

    /// Removes every entry older than the expiry window and reverses its
    /// unconfirmed effect. All or nothing.
    pub fn expire(&self) -> MempoolResult<usize> {
        let now = self.time.now();
        let mut db = self.store.begin()?;
        let expired = match self.expire_in(&mut db, now) {
            Ok(ids) => ids,
            Err(e) => {
                rollback_quietly(db);
                error!(error = %e, "[sc-03] Mempool expiry aborted");
                return Err(e);
            }
        };
        if expired.is_empty() {
            rollback_quietly(db);
            return Ok(0);
        }
        db.commit()?;

        let count = expired.len();
        metrics::record_expired(count);
        metrics::set_mempool_size(self.store.mempool_count()?);
        info!(count, "[sc-03] Expired mempool transactions");
        self.publisher.publish(ChainEvent::TransactionsExpired {
            transaction_ids: expired,
        });
        Ok(count)
    }

    fn expire_in(
        &self,
        ledger: &mut dyn LedgerWrite,
        now: Timestamp,
    ) -> MempoolResult<Vec<TransactionId>> {
        let mut ids = Vec::new();
        for entry in ledger.mempool_transactions()? {
            if entry.arrival_timestamp + self.config.expiry_seconds >= now {
                continue;
            }
            let tx = Transaction::from_bytes(&entry.transaction_bytes)?;
            tx.undo_apply_unconfirmed(ledger)?;
            ids.push(entry.id);
        }
        if !ids.is_empty() {
            ledger.remove_mempool_transactions(&ids)?;
        }
        Ok(ids)
    }

    /// Chooses the transactions to embed in a block stamped `block_timestamp`,
    /// in block order.
    pub fn select_for_block<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        block_timestamp: Timestamp,
    ) -> MempoolResult<Vec<Transaction>> {
        let mut selected: Vec<(MempoolTransaction, Transaction)> = Vec::new();
        let mut chosen: Vec<Transaction> = Vec::new();
        let mut debits: HashMap<AccountAddress, i64> = HashMap::new();
        let mut payload = 0usize;

        for entry in ledger.mempool_transactions()? {
            if selected.len() >= self.config.max_transactions_per_block {
                break;
            }
            let tx = match Transaction::from_bytes(&entry.transaction_bytes) {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(tx_id = entry.id, error = %e, "[sc-03] Skipping malformed mempool entry");
                    continue;
                }
            };
            let size = entry.transaction_bytes.len();
            if payload + size > self.config.max_payload_bytes {
                break;
            }
            if entry.arrival_timestamp + self.config.expiry_seconds < block_timestamp {
                continue;
            }
            if let Err(e) = tx.validate(ledger, &*self.signer, BalanceView::Confirmed) {
                debug!(tx_id = entry.id, error = %e, "[sc-03] Skipping invalid mempool entry");
                continue;
            }

            // Several entries from one sender must fit the confirmed balance together.
            let Ok(debit) = tx.total_debit() else {
                continue;
            };
            let already = debits.get(&tx.sender).copied().unwrap_or(0);
            let balance = ledger
                .account_balance(&tx.sender)?
                .map(|b| b.balance)
                .unwrap_or(0);
            if balance - already < debit {
                continue;
            }
            if tx.skip_mempool_transaction(&chosen) {
                continue;
            }

            *debits.entry(tx.sender).or_insert(0) += debit;
            payload += size;
            chosen.push(tx.clone());
            selected.push((entry, tx));
        }

        selected.sort_by(|a, b| block_order(&a.0, &b.0));
        Ok(selected.into_iter().map(|(_, tx)| tx).collect())
    }

    /// Transaction bodies for `ids`, from the mempool or confirmed storage.
    /// Unknown IDs are left out.
    pub fn get_transactions_by_ids<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        ids: &[TransactionId],
    ) -> MempoolResult<Vec<Transaction>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = ledger.mempool_transaction(*id)? {
                found.push(Transaction::from_bytes(&entry.transaction_bytes)?);
            } else if let Some(tx) = ledger.transaction(*id)? {
                found.push(tx);
            }
        }
        Ok(found)
    }

    /// Backs up entries admitted above `common_height` before a rollback to
    /// that height, reversing their unconfirmed effects.
    ///
    /// Returns the key-value key holding the blob, or `None` when there was
    /// nothing to back up.
    pub fn backup_for_rollback(
        &self,
        ledger: &mut dyn LedgerWrite,
        common_height: u64,
    ) -> MempoolResult<Option<String>> {
        let entries: Vec<MempoolTransaction> = ledger
            .mempool_transactions()?
            .into_iter()
            .filter(|e| e.block_height > common_height)
            .collect();
        if entries.is_empty() {
            return Ok(None);
        }

        for entry in &entries {
            let tx = Transaction::from_bytes(&entry.transaction_bytes)?;
            tx.undo_apply_unconfirmed(ledger)?;
        }
        let blob = encode_backup(
            &entries
                .iter()
                .map(|e| e.transaction_bytes.as_slice())
                .collect::<Vec<_>>(),
        );
        let key = format!("{}{}", MEMPOOL_BACKUP_PREFIX, common_height);
        self.kv.insert(&key, blob, None)?;
        info!(
            count = entries.len(),
            common_height, "[sc-03] Backed up mempool before rollback"
        );
        Ok(Some(key))
    }

    /// Re-admits the transactions of a backup blob. Entries that are no
    /// longer valid are skipped.
    pub fn restore_backup(&self, key: &str) -> MempoolResult<usize> {
        let entries = decode_backup(&self.kv.get(key)?)?;
        let mut restored = 0;
        for raw in entries {
            let mut db = self.store.begin()?;
            match self.stage(&mut db, &raw) {
                Ok(tx) => {
                    db.commit()?;
                    restored += 1;
                    self.publisher.publish(ChainEvent::TransactionAdded(tx));
                }
                Err(e) => {
                    rollback_quietly(db);
                    warn!(error = %e, "[sc-03] Skipping backed up transaction");
                }
            }
        }
        metrics::set_mempool_size(self.store.mempool_count()?);
        info!(restored, key, "[sc-03] Restored mempool backup");
        Ok(restored)
    }
}
