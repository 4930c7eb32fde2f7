//! Errors from key parsing and signature checks.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The signature does not match the message under this key.
    #[error("Signature does not verify")]
    SignatureVerificationFailed,

    /// The 32 bytes are not a valid Ed25519 point.
    #[error("Public key is not a valid Ed25519 point")]
    InvalidPublicKey,
}
