//! # Transaction Actions
//!
//! Capability interface shared by every transaction kind. Dispatch is a
//! `match` over the closed [`TransactionBody`] enum.
//!
//! ## Balance model
//!
//! - Unconfirmed effects (mempool admission) touch only the sender's
//!   spendable balance, reserving `amount + fee`.
//! - Confirmed effects (block push) move `balance` and `spendable_balance`
//!   together and update the node registry.

use crate::errors::{TransactionError, TxResult};
use sc_01_ledger_store::{LedgerRead, LedgerWrite};
use shared_crypto::NodeSigner;
use shared_types::codec::node_id;
use shared_types::entities::*;
use tracing::debug;

/// Which balance validation checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceView {
    /// Confirmed balance; used while pushing a block, after the
    /// transaction's own reservation was undone.
    Confirmed,
    /// Spendable balance, net of every pending reservation.
    Spendable,
}

/// Capability interface of a transaction kind.
pub trait TransactionAction {
    /// Structural, rule and signature checks against current ledger state.
    fn validate<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        signer: &dyn NodeSigner,
        view: BalanceView,
    ) -> TxResult<()>;

    /// Applies the confirmed effect at `height`.
    fn apply_confirmed(&self, ledger: &mut dyn LedgerWrite, height: u64) -> TxResult<()>;

    /// Reserves the sender's spendable balance.
    fn apply_unconfirmed(&self, ledger: &mut dyn LedgerWrite) -> TxResult<()>;

    /// Releases the reservation made by [`TransactionAction::apply_unconfirmed`].
    fn undo_apply_unconfirmed(&self, ledger: &mut dyn LedgerWrite) -> TxResult<()>;

    /// Value moved or locked, excluding the fee.
    fn amount(&self) -> i64;

    /// `amount + fee`, the sender's full debit.
    fn total_debit(&self) -> TxResult<i64>;

    /// Serialized size in bytes.
    fn size(&self) -> TxResult<usize>;

    /// Whether selection must skip this transaction given those already
    /// selected for the block.
    fn skip_mempool_transaction(&self, selected: &[Transaction]) -> bool;
}

fn is_registration_family(body: &TransactionBody) -> bool {
    !matches!(body, TransactionBody::SendMoney { .. })
}

fn available_balance<R: LedgerRead + ?Sized>(
    ledger: &R,
    account: &AccountAddress,
    view: BalanceView,
) -> TxResult<i64> {
    let balance = ledger.account_balance(account)?;
    Ok(match (balance, view) {
        (None, _) => 0,
        (Some(b), BalanceView::Confirmed) => b.balance,
        (Some(b), BalanceView::Spendable) => b.spendable_balance,
    })
}

impl TransactionAction for Transaction {
    fn validate<R: LedgerRead + ?Sized>(
        &self,
        ledger: &R,
        signer: &dyn NodeSigner,
        view: BalanceView,
    ) -> TxResult<()> {
        if self.fee < 0 {
            return Err(TransactionError::NegativeFee(self.fee));
        }

        match &self.body {
            TransactionBody::SendMoney { amount } => {
                if *amount <= 0 {
                    return Err(TransactionError::InvalidAmount(*amount));
                }
                if self.recipient.is_none() {
                    return Err(TransactionError::MissingRecipient);
                }
            }
            TransactionBody::NodeRegistration {
                node_public_key,
                locked_balance,
            } => {
                if *locked_balance <= 0 {
                    return Err(TransactionError::InvalidAmount(*locked_balance));
                }
                if self.recipient.is_some() {
                    return Err(TransactionError::UnexpectedRecipient);
                }
                if let Some(existing) = ledger.node_registration_by_public_key(node_public_key)? {
                    if existing.registration_status != RegistrationStatus::Deleted {
                        return Err(TransactionError::NodeAlreadyRegistered(*node_public_key));
                    }
                }
                if ledger.node_registration_by_account(&self.sender)?.is_some() {
                    return Err(TransactionError::AccountAlreadyOwnsNode);
                }
            }
            TransactionBody::UpdateNodeRegistration {
                node_public_key,
                locked_balance,
            } => {
                if *locked_balance <= 0 {
                    return Err(TransactionError::InvalidAmount(*locked_balance));
                }
                if self.recipient.is_some() {
                    return Err(TransactionError::UnexpectedRecipient);
                }
                owned_registration(ledger, &self.sender, node_public_key)?;
            }
            TransactionBody::RemoveNodeRegistration { node_public_key } => {
                if self.recipient.is_some() {
                    return Err(TransactionError::UnexpectedRecipient);
                }
                owned_registration(ledger, &self.sender, node_public_key)?;
            }
        }

        let required = self.total_debit()?;
        let available = available_balance(ledger, &self.sender, view)?;
        if available < required {
            return Err(TransactionError::InsufficientBalance {
                account: self.sender,
                required,
                available,
            });
        }

        let message = self.unsigned_bytes()?;
        if !signer.verify_node_signature(&message, &self.signature, &self.sender) {
            return Err(TransactionError::InvalidSignature);
        }
        Ok(())
    }

    fn apply_confirmed(&self, ledger: &mut dyn LedgerWrite, height: u64) -> TxResult<()> {
        let debit = self.total_debit()?;
        ledger.add_account_balance(&self.sender, -debit, -debit, 0, height)?;

        match &self.body {
            TransactionBody::SendMoney { amount } => {
                if let Some(recipient) = &self.recipient {
                    ledger.add_account_balance(recipient, *amount, *amount, 0, height)?;
                }
            }
            TransactionBody::NodeRegistration {
                node_public_key,
                locked_balance,
            } => {
                ledger.put_node_registration(&NodeRegistration {
                    node_id: node_id(node_public_key),
                    node_public_key: *node_public_key,
                    account_address: self.sender,
                    registration_height: height,
                    locked_balance: *locked_balance,
                    registration_status: RegistrationStatus::Queued,
                    height,
                })?;
                debug!(height, tx_id = self.id, "[sc-02] Node registration queued");
            }
            TransactionBody::UpdateNodeRegistration {
                node_public_key,
                locked_balance,
            } => {
                let mut registration = owned_registration(&*ledger, &self.sender, node_public_key)?;
                registration.locked_balance = registration
                    .locked_balance
                    .checked_add(*locked_balance)
                    .ok_or(TransactionError::AmountOverflow {
                        amount: *locked_balance,
                        fee: self.fee,
                    })?;
                registration.height = height;
                ledger.put_node_registration(&registration)?;
            }
            TransactionBody::RemoveNodeRegistration { node_public_key } => {
                let mut registration = owned_registration(&*ledger, &self.sender, node_public_key)?;
                let refund = registration.locked_balance;
                registration.locked_balance = 0;
                registration.registration_status = RegistrationStatus::Deleted;
                registration.height = height;
                ledger.put_node_registration(&registration)?;
                ledger.add_account_balance(&self.sender, refund, refund, 0, height)?;
                debug!(height, refund, "[sc-02] Node registration removed");
            }
        }
        Ok(())
    }

    fn apply_unconfirmed(&self, ledger: &mut dyn LedgerWrite) -> TxResult<()> {
        ledger.add_spendable_balance(&self.sender, -self.total_debit()?)?;
        Ok(())
    }

    fn undo_apply_unconfirmed(&self, ledger: &mut dyn LedgerWrite) -> TxResult<()> {
        ledger.add_spendable_balance(&self.sender, self.total_debit()?)?;
        Ok(())
    }

    fn amount(&self) -> i64 {
        match &self.body {
            TransactionBody::SendMoney { amount } => *amount,
            TransactionBody::NodeRegistration { locked_balance, .. }
            | TransactionBody::UpdateNodeRegistration { locked_balance, .. } => *locked_balance,
            TransactionBody::RemoveNodeRegistration { .. } => 0,
        }
    }

    fn total_debit(&self) -> TxResult<i64> {
        let amount = self.amount();
        amount
            .checked_add(self.fee)
            .ok_or(TransactionError::AmountOverflow {
                amount,
                fee: self.fee,
            })
    }

    fn size(&self) -> TxResult<usize> {
        Ok(Transaction::size(self)?)
    }

    fn skip_mempool_transaction(&self, selected: &[Transaction]) -> bool {
        if !is_registration_family(&self.body) {
            return false;
        }
        selected
            .iter()
            .any(|other| other.sender == self.sender && is_registration_family(&other.body))
    }
}

fn owned_registration<R: LedgerRead + ?Sized>(
    ledger: &R,
    account: &AccountAddress,
    node_public_key: &PublicKey,
) -> TxResult<NodeRegistration> {
    match ledger.node_registration_by_account(account)? {
        Some(registration) if &registration.node_public_key == node_public_key => Ok(registration),
        _ => Err(TransactionError::RegistrationNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use sc_01_ledger_store::{InMemoryLedger, LedgerStore, LedgerTx};
    use shared_crypto::Ed25519NodeSigner;

    const ALICE_SEED: [u8; 32] = [11; 32];
    const BOB_SEED: [u8; 32] = [22; 32];

    fn funded_ledger(account: &AccountAddress, amount: i64) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().unwrap();
        tx.add_account_balance(account, amount, amount, 0, 0).unwrap();
        tx.commit().unwrap();
        ledger
    }

    #[test]
    fn test_send_money_effects() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let bob = signer.public_key_from_seed(&BOB_SEED);
        let ledger = funded_ledger(&alice.address(), 1_000);
        let transfer = alice.send_money(100, bob, 300, 10).unwrap();

        transfer
            .validate(&ledger, &signer, BalanceView::Spendable)
            .unwrap();

        let mut tx = ledger.begin().unwrap();
        transfer.apply_unconfirmed(&mut tx).unwrap();
        let reserved = tx.account_balance(&alice.address()).unwrap().unwrap();
        assert_eq!(reserved.balance, 1_000);
        assert_eq!(reserved.spendable_balance, 690);

        transfer.undo_apply_unconfirmed(&mut tx).unwrap();
        transfer.apply_confirmed(&mut tx, 1).unwrap();
        tx.commit().unwrap();

        let sender = ledger.account_balance(&alice.address()).unwrap().unwrap();
        assert_eq!((sender.balance, sender.spendable_balance), (690, 690));
        let recipient = ledger.account_balance(&bob).unwrap().unwrap();
        assert_eq!((recipient.balance, recipient.spendable_balance), (300, 300));
    }

    #[test]
    fn test_insufficient_balance() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let ledger = funded_ledger(&alice.address(), 50);
        let transfer = alice.send_money(100, [9; 32], 45, 10).unwrap();

        let err = transfer
            .validate(&ledger, &signer, BalanceView::Spendable)
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::InsufficientBalance {
                required: 55,
                available: 50,
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_debit_rejected() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let ledger = funded_ledger(&alice.address(), 10);
        let transfer = alice.send_money(100, [9; 32], i64::MAX, 1).unwrap();

        let overflow = TransactionError::AmountOverflow {
            amount: i64::MAX,
            fee: 1,
        };
        assert_eq!(transfer.total_debit().unwrap_err(), overflow);
        let err = transfer
            .validate(&ledger, &signer, BalanceView::Spendable)
            .unwrap_err();
        assert_eq!(err, overflow);
        assert_eq!(err.kind(), shared_types::ErrorKind::Validation);

        let mut tx = ledger.begin().unwrap();
        assert_eq!(transfer.apply_unconfirmed(&mut tx).unwrap_err(), overflow);
        assert_eq!(transfer.apply_confirmed(&mut tx, 1).unwrap_err(), overflow);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let ledger = funded_ledger(&alice.address(), 1_000);
        let mut transfer = alice.send_money(100, [9; 32], 10, 1).unwrap();
        transfer.fee = 2;

        let err = transfer
            .validate(&ledger, &signer, BalanceView::Spendable)
            .unwrap_err();
        assert_eq!(err, TransactionError::InvalidSignature);
    }

    #[test]
    fn test_registration_lifecycle() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let node_key = signer.public_key_from_seed(&[5; 32]);
        let ledger = funded_ledger(&alice.address(), 10_000);

        let register = alice.register_node(100, node_key, 5_000, 1).unwrap();
        register
            .validate(&ledger, &signer, BalanceView::Spendable)
            .unwrap();
        let mut tx = ledger.begin().unwrap();
        register.apply_confirmed(&mut tx, 3).unwrap();
        tx.commit().unwrap();

        let reg = ledger.node_registration_by_public_key(&node_key).unwrap().unwrap();
        assert_eq!(reg.registration_status, RegistrationStatus::Queued);
        assert_eq!(reg.locked_balance, 5_000);
        assert_eq!(
            ledger.account_balance(&alice.address()).unwrap().unwrap().balance,
            4_999
        );

        // A second registration from the same account is refused.
        let again = alice
            .register_node(101, signer.public_key_from_seed(&[6; 32]), 10, 1)
            .unwrap();
        assert_eq!(
            again
                .validate(&ledger, &signer, BalanceView::Spendable)
                .unwrap_err(),
            TransactionError::AccountAlreadyOwnsNode
        );

        let update = alice.update_node(102, node_key, 1_000, 1).unwrap();
        let remove = alice.remove_node(103, node_key, 1).unwrap();
        let mut tx = ledger.begin().unwrap();
        update.validate(&tx, &signer, BalanceView::Confirmed).unwrap();
        update.apply_confirmed(&mut tx, 4).unwrap();
        remove.validate(&tx, &signer, BalanceView::Confirmed).unwrap();
        remove.apply_confirmed(&mut tx, 5).unwrap();
        tx.commit().unwrap();

        let reg = ledger.node_registration_by_public_key(&node_key).unwrap().unwrap();
        assert_eq!(reg.registration_status, RegistrationStatus::Deleted);
        assert_eq!(reg.locked_balance, 0);
        // 10_000 - 5_001 - 1_001 - 1 + 6_000 refund
        assert_eq!(
            ledger.account_balance(&alice.address()).unwrap().unwrap().balance,
            9_997
        );
    }

    #[test]
    fn test_skip_second_registration_from_same_sender() {
        let signer = Ed25519NodeSigner::new();
        let alice = TransactionBuilder::new(&signer, ALICE_SEED);
        let node_key = signer.public_key_from_seed(&[5; 32]);
        let register = alice.register_node(1, node_key, 10, 1).unwrap();
        let update = alice.update_node(2, node_key, 10, 1).unwrap();
        let transfer = alice.send_money(3, [1; 32], 10, 1).unwrap();

        assert!(!register.skip_mempool_transaction(&[transfer.clone()]));
        assert!(update.skip_mempool_transaction(&[transfer.clone(), register]));
        assert!(!transfer.skip_mempool_transaction(&[update]));
    }
}
