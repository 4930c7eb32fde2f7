//! # Block-Incomplete-Queue (sc-04)
//!
//! Holds blocks whose transaction bodies are not fully known yet and
//! completes them as the missing transactions arrive.
//!
//! ## Indices
//!
//! | Index | Maps | Purpose |
//! |-------|------|---------|
//! | required | block ID -> {tx ID -> position} | what a block still needs |
//! | waiters | tx ID -> {block ID} | which blocks a transaction unblocks |
//!
//! Both indices are updated under one lock, so removing a block removes it
//! from every waiter set and satisfying a transaction removes it from every
//! requirement set.

pub mod config;
pub mod queue;

pub use config::IncompleteQueueConfig;
pub use queue::{BlockIncompleteQueue, BlockWithMetaData};
