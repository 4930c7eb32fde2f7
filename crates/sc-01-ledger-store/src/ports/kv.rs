//! # Key-Value Port
//!
//! Fast key-value store used for receipt reminders and mempool backups.
//! Keys are strings grouped by prefix.

use crate::domain::errors::StoreResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// Abstract interface for the fast key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Value stored at `key`. Fails with `StoreError::NotFound` when absent
    /// or expired.
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Stores `value`, replacing any previous value. `None` never expires.
    fn insert(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()>;

    /// Every live entry whose key starts with `prefix`.
    fn get_by_prefix(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>>;
}
