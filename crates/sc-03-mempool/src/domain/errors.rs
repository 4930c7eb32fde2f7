//! Mempool error types.

use sc_01_ledger_store::StoreError;
use sc_02_transactions::TransactionError;
use shared_types::{CodecError, ErrorKind, TransactionId};
use thiserror::Error;

/// Mempool error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// Pool has reached maximum capacity.
    #[error("Mempool full at {capacity} transactions")]
    PoolFull { capacity: usize },

    /// Transaction is already pending or confirmed.
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(TransactionId),

    /// A receipt for this datum was already issued to the sender.
    #[error("Receipt already issued for transaction {0}")]
    ReceiptAlreadyIssued(TransactionId),

    /// Malformed transaction bytes or backup blob.
    #[error("Parse error: {0}")]
    Parse(#[from] CodecError),

    #[error("Transaction rejected: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl MempoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PoolFull { .. } => ErrorKind::Capacity,
            Self::DuplicateTransaction(_) | Self::ReceiptAlreadyIssued(_) => ErrorKind::Duplicate,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Transaction(e) => e.kind(),
            Self::Store(StoreError::UniqueViolation { .. }) => ErrorKind::Duplicate,
            Self::Store(e) => e.kind(),
        }
    }
}

/// Result type for mempool operations.
pub type MempoolResult<T> = Result<T, MempoolError>;
