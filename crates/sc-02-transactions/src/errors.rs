//! # Transaction Errors

use sc_01_ledger_store::StoreError;
use shared_types::{AccountAddress, CodecError, ErrorKind, PublicKey};
use thiserror::Error;

/// Errors raised while validating or applying a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("Invalid transaction signature")]
    InvalidSignature,

    #[error("Negative fee: {0}")]
    NegativeFee(i64),

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Amount {amount} plus fee {fee} overflows")]
    AmountOverflow { amount: i64, fee: i64 },

    #[error("Transaction kind requires a recipient")]
    MissingRecipient,

    #[error("Transaction kind does not take a recipient")]
    UnexpectedRecipient,

    #[error("Insufficient balance for {account:02x?}: required {required}, available {available}")]
    InsufficientBalance {
        account: AccountAddress,
        required: i64,
        available: i64,
    },

    #[error("Node key already registered: {0:02x?}")]
    NodeAlreadyRegistered(PublicKey),

    #[error("Account already owns a registered node")]
    AccountAlreadyOwnsNode,

    #[error("No live registration for this account and node key")]
    RegistrationNotFound,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Codec(_) => ErrorKind::Parse,
            _ => ErrorKind::Validation,
        }
    }
}

/// Result type for transaction operations.
pub type TxResult<T> = Result<T, TransactionError>;
