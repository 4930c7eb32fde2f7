//! # Domain Errors
//!
//! Error types for the Ledger Store subsystem.

use shared_types::{CodecError, ErrorKind};
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Expected record absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A row with the same key already exists.
    #[error("Unique constraint violated on {table}: {key}")]
    UniqueViolation { table: &'static str, key: String },

    /// Stored bytes could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UniqueViolation { .. } => ErrorKind::Duplicate,
            Self::Codec(_) => ErrorKind::Parse,
            Self::Backend(_) => ErrorKind::Db,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
