//! # Ports Layer
//!
//! - `ledger.rs` - Transactional ledger tables
//! - `kv.rs` - Fast key-value store with TTL
//! - `time.rs` - Clock abstraction

pub mod kv;
pub mod ledger;
pub mod time;
