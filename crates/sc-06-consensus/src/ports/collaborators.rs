//! Ledger-lifecycle collaborators invoked inside a block push.

use crate::domain::ConsensusResult;
use sc_01_ledger_store::LedgerWrite;
use shared_types::entities::Block;

/// Published receipts of a block, split by whether they link to a prior
/// block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiptCounts {
    pub linked: u32,
    pub unlinked: u32,
}

/// Validates and records the published receipts of a block being pushed.
pub trait ReceiptProcessor: Send + Sync {
    fn process(&self, ledger: &mut dyn LedgerWrite, block: &Block)
        -> ConsensusResult<ReceiptCounts>;
}

/// Releases escrow-style holds that fall due at a height.
pub trait HoldExpiry: Send + Sync {
    fn expire_holds(&self, ledger: &mut dyn LedgerWrite, height: u64) -> ConsensusResult<()>;
}
