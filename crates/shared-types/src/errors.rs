//! # Error Types
//!
//! Defines the error taxonomy shared across subsystems and the codec errors
//! raised by canonical encoding.

use std::fmt;
use thiserror::Error;

/// Caller-facing category of a failure.
///
/// Every subsystem error enum maps onto one of these through `kind()`, so
/// callers can branch on the category without knowing the concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural or business-rule violation.
    Validation,
    /// Transaction or block already known.
    Duplicate,
    /// Producer not eligible or not found in the expected ordering.
    Blocksmith,
    /// Storage-layer failure.
    Db,
    /// Expected record absent.
    NotFound,
    /// Mempool full.
    Capacity,
    /// A competing block at the same height has higher cumulative difficulty.
    StaleChain,
    /// The producer already has a block waiting in the block pool.
    DuplicatePool,
    /// A pooled block failed to push during a pool scan.
    ScanPool,
    /// Received block does not connect to the local chain.
    InvalidBlock,
    /// Malformed bytes.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "ValidationErr",
            Self::Duplicate => "DuplicateErr",
            Self::Blocksmith => "BlocksmithErr",
            Self::Db => "DBErr",
            Self::NotFound => "NotFoundErr",
            Self::Capacity => "CapacityErr",
            Self::StaleChain => "StaleChainErr",
            Self::DuplicatePool => "DuplicatePoolErr",
            Self::ScanPool => "ScanPoolErr",
            Self::InvalidBlock => "InvalidBlockErr",
            Self::Parse => "ParseErr",
        };
        f.write_str(name)
    }
}

/// Errors raised while encoding or decoding canonical bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Serialization failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Bytes could not be decoded.
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Input shorter than the fixed-size trailer.
    #[error("Truncated input: {len} bytes")]
    Truncated { len: usize },

    /// Bytes remained after a complete value was decoded.
    #[error("Trailing bytes after decoded value: {extra}")]
    TrailingBytes { extra: usize },
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encode(_) => ErrorKind::Validation,
            _ => ErrorKind::Parse,
        }
    }
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        CodecError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_names() {
        assert_eq!(ErrorKind::Duplicate.to_string(), "DuplicateErr");
        assert_eq!(ErrorKind::Db.to_string(), "DBErr");
        assert_eq!(ErrorKind::StaleChain.to_string(), "StaleChainErr");
    }

    #[test]
    fn test_codec_error_kinds() {
        assert_eq!(CodecError::Truncated { len: 3 }.kind(), ErrorKind::Parse);
        assert_eq!(CodecError::Encode("x".into()).kind(), ErrorKind::Validation);
    }
}
