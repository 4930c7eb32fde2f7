//! # Shared Types Crate
//!
//! Domain entities, canonical codec and the error taxonomy shared by every
//! subsystem of the chain core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Deterministic Identity**: IDs are pure functions of canonical bytes, so
//!   honest nodes agree on them.

pub mod codec;
pub mod entities;
pub mod errors;

pub use codec::*;
pub use entities::*;
pub use errors::*;
