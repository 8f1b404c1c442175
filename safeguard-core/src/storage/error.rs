//! Error types for persistence operations.

use thiserror::Error;

/// Error type for persistence operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock guarding the store was poisoned.
    #[error("Lock error: {0}")]
    Lock(String),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_error_display() {
        let err = StorageError::Lock("poisoned".to_string());
        assert_eq!(err.to_string(), "Lock error: poisoned");
    }

    #[test]
    fn serialization_error_display() {
        let err = StorageError::Serialization("alertHistory: eof".to_string());
        assert_eq!(err.to_string(), "Serialization error: alertHistory: eof");
    }
}
