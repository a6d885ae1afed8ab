//! In-memory key/value store.

use dashmap::DashMap;

use super::{KeyValueStore, StoreResult};

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
