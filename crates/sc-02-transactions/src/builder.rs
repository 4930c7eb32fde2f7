//! Signed transaction construction for local accounts.

use crate::errors::TxResult;
use shared_crypto::NodeSigner;
use shared_types::entities::*;

/// Builds and signs transactions on behalf of one account seed.
pub struct TransactionBuilder<'a> {
    signer: &'a dyn NodeSigner,
    seed: [u8; 32],
    address: AccountAddress,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(signer: &'a dyn NodeSigner, seed: [u8; 32]) -> Self {
        let address = signer.public_key_from_seed(&seed);
        Self {
            signer,
            seed,
            address,
        }
    }

    /// Account address of the seed (its public key).
    pub fn address(&self) -> AccountAddress {
        self.address
    }

    /// Signs and seals an arbitrary body.
    pub fn build(
        &self,
        timestamp: Timestamp,
        recipient: Option<AccountAddress>,
        fee: i64,
        body: TransactionBody,
    ) -> TxResult<Transaction> {
        let unsigned = Transaction::new(timestamp, self.address, recipient, fee, body);
        let signature = self
            .signer
            .sign_by_node(&unsigned.unsigned_bytes()?, &self.seed);
        Ok(unsigned.seal(signature)?)
    }

    pub fn send_money(
        &self,
        timestamp: Timestamp,
        recipient: AccountAddress,
        amount: i64,
        fee: i64,
    ) -> TxResult<Transaction> {
        self.build(
            timestamp,
            Some(recipient),
            fee,
            TransactionBody::SendMoney { amount },
        )
    }

    pub fn register_node(
        &self,
        timestamp: Timestamp,
        node_public_key: PublicKey,
        locked_balance: i64,
        fee: i64,
    ) -> TxResult<Transaction> {
        self.build(
            timestamp,
            None,
            fee,
            TransactionBody::NodeRegistration {
                node_public_key,
                locked_balance,
            },
        )
    }

    /// `additional_lock` is added to the registration's locked balance.
    pub fn update_node(
        &self,
        timestamp: Timestamp,
        node_public_key: PublicKey,
        additional_lock: i64,
        fee: i64,
    ) -> TxResult<Transaction> {
        self.build(
            timestamp,
            None,
            fee,
            TransactionBody::UpdateNodeRegistration {
                node_public_key,
                locked_balance: additional_lock,
            },
        )
    }

    pub fn remove_node(
        &self,
        timestamp: Timestamp,
        node_public_key: PublicKey,
        fee: i64,
    ) -> TxResult<Transaction> {
        self.build(
            timestamp,
            None,
            fee,
            TransactionBody::RemoveNodeRegistration { node_public_key },
        )
    }
}
