//! Cross-subsystem flows over in-memory nodes.

pub mod forks;
pub mod propagation;
