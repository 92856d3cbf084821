//! Key-value persistence
//!
//! Preferences are persisted as JSON strings under fixed keys. Reads that
//! find corrupted data discard it and fall back to defaults; failed writes are
//! logged and skipped. Neither ever propagates to the caller.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::StorageResult;

/// Default quota for a store, mirroring typical browser local storage
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Load and deserialize a JSON value
///
/// Returns `None` when the key is missing, unreadable or corrupted. Corrupted
/// entries are removed so the next save starts clean.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!(key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding corrupted stored value");
            if let Err(e) = store.remove(key) {
                error!(key, error = %e, "Failed to remove corrupted value");
            }
            None
        }
    }
}

/// Serialize and store a JSON value, logging instead of failing
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            error!(key, error = %e, "Failed to serialize value");
            return false;
        }
    };

    match store.set(key, &raw) {
        Ok(()) => true,
        Err(e) => {
            error!(key, error = %e, "Failed to save value");
            false
        }
    }
}
