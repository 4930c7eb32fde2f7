//! # Mempool (sc-03)
//!
//! Gatekeeper and priority queue for transactions not yet in a block.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | 1 | No duplicate transactions | `service.rs` - `admit()` check plus the store's unique key |
//! | 2 | Deterministic block order | `domain/ordering.rs` - `block_order()` |
//! | 3 | No orphaned reservations | `service.rs` - admission and expiry share one ledger transaction with the balance effect |
//! | 4 | All-or-nothing expiry | `service.rs` - `expire()` |
//!
//! ## Module Structure
//!
//! - `domain/` - Config, errors, ordering, backup blob codec
//! - `service.rs` - `MempoolService`
//! - `receipt.rs` - `ReceiptService`
//! - `metrics.rs` - Prometheus metrics (feature `metrics`)

pub mod domain;
pub mod metrics;
pub mod receipt;
pub mod service;

pub use domain::*;
pub use receipt::{ReceiptService, RECEIPT_REMINDER_PREFIX};
pub use service::{rollback_quietly, MempoolService, MEMPOOL_BACKUP_PREFIX};
