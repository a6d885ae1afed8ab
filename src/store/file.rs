// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-file key/value store.
//!
//! The whole map is kept in memory and rewritten on every mutation. Writes go
//! to a sibling temp file that is renamed over the target, so a crash leaves
//! either the old or the new contents.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{KeyValueStore, StoreError, StoreResult};

/// Durable store backed by a single JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating it lazily on first write.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Malformed {
                key: path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        tracing::info!(path = %path.display(), keys = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    // Changes reach memory only after they reach disk.
    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = self.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}
