//! Default implementations of the block service ports.

pub mod holds;
pub mod receipts;
pub mod strategy;

pub use holds::NoHoldExpiry;
pub use receipts::StoringReceiptProcessor;
pub use strategy::RegistryBlocksmithStrategy;
