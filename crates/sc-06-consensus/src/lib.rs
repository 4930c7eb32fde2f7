//! # Block Service (sc-06)
//!
//! Validates incoming and self-generated blocks, applies them to the ledger
//! inside one transaction, resolves forks by cumulative difficulty and
//! maintains the node registry.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Atomic Push | A block's ledger effects commit together or not at all |
//! | 2 | Single Writer | Push, pop-off and pool scan hold the chain write lock |
//! | 3 | Position Order | Transactions apply in their recorded block position |
//! | 4 | Fork Choice | A block never replaces a competitor with higher cumulative difficulty |
//! | 5 | Persist Window | Index `i > 0` persists only inside `(end(i - 1), end(i)]` |
//! | 6 | Bounded Rollback | Pop-off deeper than the maximum depth is refused |
//! | 7 | Score Bounds | Participation scores stay within `[0, max]` |
//!
//! ## Push State Machine
//!
//! ```text
//! height / index / difficulty ──→ begin tx ──→ expire holds ──→ insert block
//!        │                                                           │
//!        │ DuplicatePool                       per transaction: undo reservation,
//!        ↓                                     validate, apply, insert
//!      reject                                                        │
//!                                 remove from mempool ←──────────────┘
//!                                        │
//!                 receipts ──→ scores / skipped / lottery ──→ expel / admit
//!                                        │
//!                        ┌───────────────┴───────────────┐
//!                 premature (index > 0,              otherwise
//!                 outside window)                        │
//!                        │                            commit ──→ re-sort, clear pool,
//!                 pool + rollback                                broadcast, notify
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_06_consensus::{BlockService, BlockServiceDependencies};
//!
//! let service = BlockService::new(deps);
//! service.add_genesis(&genesis_config)?;
//! if let Some(outcome) = service.try_produce(&node_seed)? {
//!     // pushed or pooled
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{NoHoldExpiry, RegistryBlocksmithStrategy, StoringReceiptProcessor};
pub use domain::{
    build_genesis_block, ConsensusConfig, ConsensusError, ConsensusResult, GenesisAccount,
    GenesisConfig, GenesisNode, ScrambledNodes,
};
pub use ports::{Blocksmith, BlocksmithStrategy, HoldExpiry, ReceiptCounts, ReceiptProcessor};
pub use service::{
    BlockService, BlockServiceDependencies, PushMode, PushOutcome, QueueOutcome, ReceiveOutcome,
};
