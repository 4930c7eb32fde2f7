//! In-memory key-value store with TTL.

use crate::domain::errors::{StoreError, StoreResult};
use crate::ports::kv::KeyValueStore;
use crate::ports::time::TimeSource;
use parking_lot::RwLock;
use shared_types::Timestamp;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Timestamp>,
}

impl Entry {
    fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory key-value store.
///
/// Expired entries are invisible to reads and dropped on the next insert.
pub struct InMemoryKVStore {
    data: RwLock<BTreeMap<String, Entry>>,
    time_source: Arc<dyn TimeSource>,
}

impl InMemoryKVStore {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            time_source,
        }
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let now = self.time_source.now();
        self.data
            .read()
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn insert(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()> {
        let now = self.time_source.now();
        let mut data = self.data.write();
        data.retain(|_, entry| entry.is_live(now));
        data.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| now.saturating_add(ttl.as_secs())),
            },
        );
        Ok(())
    }

    fn get_by_prefix(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        let now = self.time_source.now();
        Ok(self
            .data
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(k, entry)| (k.clone(), entry.value.clone()))
            .collect())
    }
}
