//! # Shared Crypto
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Node, block and transaction signatures |
//! | `signer` | Ed25519 | `NodeSigner` port used by the consensus core |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod signatures;
#[allow(missing_docs)]
pub mod signer;

// Re-exports
pub use errors::CryptoError;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey};
pub use signer::{Ed25519NodeSigner, NodeSigner};
