//! Error types for the block service.

use sc_01_ledger_store::StoreError;
use sc_02_transactions::TransactionError;
use sc_03_mempool::MempoolError;
use shared_types::{BlockId, CodecError, ErrorKind, PublicKey, Timestamp, TransactionId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("Payload hash or length does not match the block content")]
    InvalidPayload,

    #[error("Block totals do not match its transactions")]
    InvalidTotals,

    #[error("Timestamp too far in future: {timestamp}, current is {now}")]
    FutureTimestamp { timestamp: Timestamp, now: Timestamp },

    #[error("Blocksmith {0:02x?} is not eligible")]
    BlocksmithNotEligible(PublicKey),

    #[error("Blocksmith {0:02x?} missing from the previous block's ordering")]
    BlocksmithNotFound(PublicKey),

    #[error("Block at {timestamp} precedes its smith time {smith_time}")]
    PrematureBlock {
        timestamp: Timestamp,
        smith_time: Timestamp,
    },

    #[error("Block ID is zero")]
    ZeroBlockId,

    #[error("Block hash or ID does not match its content")]
    InvalidBlockHash,

    #[error("Invalid block signature")]
    InvalidBlockSignature,

    #[error("Previous block hash mismatch")]
    PreviousHashMismatch,

    #[error("Block at height {height} has a competitor with higher cumulative difficulty")]
    StaleChain { height: u64 },

    #[error("Block pool already holds a block for blocksmith index {0}")]
    DuplicatePool(u32),

    #[error("Block {0} already known")]
    DuplicateBlock(BlockId),

    #[error("Transaction {tx_id} rejected: {source}")]
    TransactionInvalid {
        tx_id: TransactionId,
        #[source]
        source: TransactionError,
    },

    #[error("Published receipt {index} is invalid")]
    InvalidReceipt { index: usize },

    #[error("Pushing pooled block of index {blocksmith_index} failed: {source}")]
    ScanPool {
        blocksmith_index: u32,
        #[source]
        source: Box<ConsensusError>,
    },

    #[error("Block does not extend the local chain")]
    UnknownPreviousBlock,

    #[error("Fork switch failed: {source}")]
    ForkSwitchFailed {
        #[source]
        source: Box<ConsensusError>,
    },

    #[error("Genesis block missing")]
    MissingGenesis,

    #[error("Stored genesis block does not match the configuration")]
    GenesisMismatch,

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlocksmithNotEligible(_)
            | Self::BlocksmithNotFound(_)
            | Self::PrematureBlock { .. } => ErrorKind::Blocksmith,
            Self::StaleChain { .. } => ErrorKind::StaleChain,
            Self::DuplicatePool(_) => ErrorKind::DuplicatePool,
            Self::DuplicateBlock(_) => ErrorKind::Duplicate,
            Self::ScanPool { .. } => ErrorKind::ScanPool,
            Self::UnknownPreviousBlock | Self::ForkSwitchFailed { .. } => ErrorKind::InvalidBlock,
            Self::MissingGenesis => ErrorKind::NotFound,
            Self::Transaction(e) => e.kind(),
            Self::Mempool(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Codec(_) => ErrorKind::Parse,
            _ => ErrorKind::Validation,
        }
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ConsensusError::StaleChain { height: 3 }.kind(), ErrorKind::StaleChain);
        assert_eq!(ConsensusError::DuplicatePool(1).kind(), ErrorKind::DuplicatePool);
        assert_eq!(
            ConsensusError::BlocksmithNotEligible([0; 32]).kind(),
            ErrorKind::Blocksmith
        );
        assert_eq!(
            ConsensusError::TransactionInvalid {
                tx_id: 1,
                source: TransactionError::InvalidSignature
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ConsensusError::ForkSwitchFailed {
                source: Box::new(ConsensusError::InvalidBlockSignature)
            }
            .kind(),
            ErrorKind::InvalidBlock
        );
        assert_eq!(ConsensusError::MissingGenesis.kind(), ErrorKind::NotFound);
    }
}
