//! # Mempool Domain
//!
//! Pure logic: configuration, errors, block ordering and the backup blob.

pub mod backup;
pub mod config;
pub mod errors;
pub mod ordering;

pub use backup::{decode_backup, encode_backup};
pub use config::MempoolConfig;
pub use errors::{MempoolError, MempoolResult};
pub use ordering::{block_order, fee_per_byte};
