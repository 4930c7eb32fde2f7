//! Ports of the block service.
//!
//! Reference: the Blocksmith Strategy, receipt processing and hold expiry
//! collaborators of the push state machine.

pub mod collaborators;
pub mod strategy;

pub use collaborators::{HoldExpiry, ReceiptCounts, ReceiptProcessor};
pub use strategy::{Blocksmith, BlocksmithStrategy};
