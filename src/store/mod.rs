// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key/value storage layer.
//!
//! Values are JSON strings, mirroring the browser-local store the state
//! core was designed around. Access is synchronous and single-writer.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{de::DeserializeOwned, Serialize};

/// Storage key names as constants.
pub mod keys {
    /// Logged-in user record
    pub const CURRENT_USER: &str = "currentUser";
    /// Active tracking session, absent while idle
    pub const TRACKING_SESSION: &str = "trackingSession";
    /// Archived tracking sessions (JSON array)
    pub const SESSION_HISTORY: &str = "sessionHistory";
    /// Prefix for pending one-time passcodes, one key per contact
    pub const OTP_PREFIX: &str = "otp_";

    /// Key holding the pending passcode for `contact`.
    pub fn otp(contact: &str) -> String {
        format!("{OTP_PREFIX}{contact}")
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Malformed value under key {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A string key/value store with get/set/remove semantics.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Read and deserialize the JSON value under `key`.
///
/// Returns `StoreError::Malformed` when the value exists but does not parse.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StoreResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Serialize `value` as JSON and store it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(key, raw)
}
