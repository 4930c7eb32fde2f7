//! # Adapters
//!
//! In-memory implementations of the store ports.

pub mod kv_memory;
pub mod memory;
