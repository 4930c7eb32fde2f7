use crate::domain::ConsensusResult;
use crate::ports::HoldExpiry;
use sc_01_ledger_store::LedgerWrite;

/// Hold expiry for a ledger without escrow holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHoldExpiry;

impl HoldExpiry for NoHoldExpiry {
    fn expire_holds(&self, _ledger: &mut dyn LedgerWrite, _height: u64) -> ConsensusResult<()> {
        Ok(())
    }
}
