//! # Ledger Store (sc-01)
//!
//! The storage collaborator of the chain core: transactional ledger tables
//! and a fast key-value store.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Explicit Transactions | Mutations require a `LedgerTx` handle |
//! | 2 | Serialized Writers | At most one transaction is open at a time |
//! | 3 | Atomic Commit | A transaction's writes become visible together or not at all |
//! | 4 | Unique Keys | Duplicate block, transaction or mempool IDs fail with `UniqueViolation` |
//! | 5 | Height Versioning | Rollback to height `h` removes everything recorded above `h` |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Ledger tables and errors
//! - `ports/` - Ledger, key-value and clock traits
//! - `adapters/` - In-memory implementations
//!
//! ## Usage
//!
//! ```ignore
//! use sc_01_ledger_store::{InMemoryLedger, LedgerStore, LedgerTx, LedgerWrite};
//!
//! let ledger = InMemoryLedger::new();
//! let mut tx = ledger.begin()?;
//! tx.insert_block(&genesis)?;
//! tx.commit()?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::kv_memory::InMemoryKVStore;
pub use adapters::memory::{InMemoryLedger, InMemoryLedgerTx};
pub use domain::errors::{StoreError, StoreResult};
pub use domain::state::{LedgerState, VersionedTable};
pub use ports::kv::KeyValueStore;
pub use ports::ledger::{LedgerRead, LedgerStore, LedgerTx, LedgerWrite};
pub use ports::time::{ManualTimeSource, SystemTimeSource, TimeSource};
