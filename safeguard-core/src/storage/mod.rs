//! Key/value persistence for engine state that must survive a restart.
//!
//! The engine never talks to a database directly. It reads and writes JSON
//! strings through the [`Persistence`] trait, so the embedding application
//! can back it with whatever the platform offers.
//!
//! # Keys
//!
//! | Key                 | Contents                                  |
//! |---------------------|-------------------------------------------|
//! | `securityCredential`| salted digest of the code plus interval   |
//! | `lastVerified`      | timestamp of the last confirmed check-in  |
//! | `emergencyContacts` | ordered contact list                      |
//! | `alertHistory`      | bounded alert log (50 entries)            |
//! | `locationTrail`     | bounded location trail                    |
//! | `trackingSessions`  | bounded tracking session log (10 entries) |

mod error;
mod memory;
mod sqlite;

pub use error::{Result, StorageError};
pub use memory::MemoryPersistence;
pub use sqlite::SqlitePersistence;

/// Storage key for the security credential record.
pub const KEY_SECURITY_CREDENTIAL: &str = "securityCredential";
/// Storage key for the last confirmed verification timestamp.
pub const KEY_LAST_VERIFIED: &str = "lastVerified";
/// Storage key for the emergency contact list.
pub const KEY_EMERGENCY_CONTACTS: &str = "emergencyContacts";
/// Storage key for the alert history.
pub const KEY_ALERT_HISTORY: &str = "alertHistory";
/// Storage key for the location trail.
pub const KEY_LOCATION_TRAIL: &str = "locationTrail";
/// Storage key for finished tracking sessions.
pub const KEY_TRACKING_SESSIONS: &str = "trackingSessions";

/// Durable string storage keyed by name.
pub trait Persistence: Send + Sync {
    /// Loads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Loads and deserializes a JSON value stored under `key`.
///
/// # Errors
///
/// Returns an error if the store fails or the stored JSON is malformed.
pub fn load_json<T: serde::de::DeserializeOwned>(
    store: &dyn Persistence,
    key: &str,
) -> Result<Option<T>> {
    match store.load(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}"))),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the store fails.
pub fn save_json<T: serde::Serialize + ?Sized>(
    store: &dyn Persistence,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
    store.save(key, &raw)
}
