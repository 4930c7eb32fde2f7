//! # Smith-Chain Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks
//! └── src/
//!     ├── fixtures.rs   # Multi-node networks sharing one genesis
//!     └── integration/  # Cross-subsystem flows
//!         ├── propagation.rs
//!         └── forks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo bench -p sc-tests
//! ```

pub mod fixtures;
pub mod integration;
