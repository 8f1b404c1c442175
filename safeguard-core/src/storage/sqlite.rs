//! `SQLite` persistence.
//!
//! Stores every engine record in a single key/value table. Values are the
//! JSON documents produced by the engine; the table does not interpret them.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::error::{Result, StorageError};
use super::Persistence;

/// `SQLite`-based [`Persistence`].
///
/// Thread-safe wrapper around a `SQLite` connection.
pub struct SqlitePersistence {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqlitePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersistence").finish_non_exhaustive()
    }
}

impl SqlitePersistence {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire database lock: {e}")))
    }
}

impl Persistence for SqlitePersistence {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_roundtrip() {
        let store = SqlitePersistence::in_memory().unwrap();
        store.save("alertHistory", "[]").unwrap();
        assert_eq!(store.load("alertHistory").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn upsert_replaces_value() {
        let store = SqlitePersistence::in_memory().unwrap();
        store.save("lastVerified", "1").unwrap();
        store.save("lastVerified", "2").unwrap();
        assert_eq!(store.load("lastVerified").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_deletes_row() {
        let store = SqlitePersistence::in_memory().unwrap();
        store.save("securityCredential", "{}").unwrap();
        store.remove("securityCredential").unwrap();
        assert!(store.load("securityCredential").unwrap().is_none());
    }

    #[test]
    fn debug_does_not_expose_connection() {
        let store = SqlitePersistence::in_memory().unwrap();
        assert!(format!("{store:?}").contains("SqlitePersistence"));
    }
}
