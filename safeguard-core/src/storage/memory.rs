//! In-process persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{Result, StorageError};
use super::Persistence;

/// Volatile [`Persistence`] backed by a `HashMap`.
///
/// Useful for tests and for hosts that do not need state to survive a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire store lock: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire store lock: {e}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire store lock: {e}")))?;
        entries.remove(key);
        Ok(())
    }
}
