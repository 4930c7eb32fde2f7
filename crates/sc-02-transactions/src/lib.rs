//! # Transactions (sc-02)
//!
//! Validation and ledger effects of every transaction kind.
//!
//! | Kind | Amount | Confirmed effect |
//! |------|--------|------------------|
//! | `SendMoney` | transferred value | credits the recipient |
//! | `NodeRegistration` | locked balance | queues a node registration |
//! | `UpdateNodeRegistration` | additional lock | raises the locked balance |
//! | `RemoveNodeRegistration` | 0 | deletes the registration, refunds the lock |
//!
//! Every kind debits `amount + fee` from the sender.

pub mod action;
pub mod builder;
pub mod errors;

pub use action::{BalanceView, TransactionAction};
pub use builder::TransactionBuilder;
pub use errors::{TransactionError, TxResult};
