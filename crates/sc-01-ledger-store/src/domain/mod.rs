//! # Domain Layer
//!
//! - `state` - Ledger tables and their height-versioned rollback
//! - `errors` - Domain error types

pub mod errors;
pub mod state;
