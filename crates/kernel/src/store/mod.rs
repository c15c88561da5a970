//! Persistent key-value store abstraction.
//!
//! Every piece of persisted state (the content document, login attempts,
//! lockouts, sessions, rate-limit windows, the security log) lives under a
//! logical string key as a JSON value. All reads and writes go through
//! [`KeyValueStore`], so the backend can be swapped without touching callers.
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local, used by tests and throwaway sessions
//! - [`FileStore`] - one JSON file holding the whole key space
//!
//! # Corruption
//!
//! A value that fails to parse is treated as absent. [`load_or_default`]
//! never surfaces a parse error to the caller; it logs and substitutes the
//! type's default.

mod file;
pub mod keys;
mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;

/// A string-keyed, string-valued persistent store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// Load and decode the value under `key`.
///
/// Returns `None` when the key is absent, unreadable, or holds a value that
/// does not decode as `T`.
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key = %key, error = %e, "store read failed, treating as empty");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "corrupt stored value, treating as empty");
            None
        }
    }
}

/// Load and decode the value under `key`, falling back to `T::default()`.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    load(store, key).unwrap_or_default()
}

/// Encode `value` as JSON and store it under `key`.
pub fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load::<Vec<i64>>(&store, "absent"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        save(&store, "numbers", &vec![1_i64, 2, 3]).unwrap();
        assert_eq!(load::<Vec<i64>>(&store, "numbers"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_value_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set("numbers", "{not json".to_string()).unwrap();
        let numbers: Vec<i64> = load_or_default(&store, "numbers");
        assert!(numbers.is_empty());
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set("numbers", r#"{"a":1}"#.to_string()).unwrap();
        let numbers: Vec<i64> = load_or_default(&store, "numbers");
        assert!(numbers.is_empty());
    }
}
