//! Error types for credential setup.

use thiserror::Error;

use crate::storage::StorageError;

/// Rejected credential input. Reported to the caller, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The code contains something other than ASCII digits.
    #[error("Security code must contain only numbers")]
    CodeNotNumeric,

    /// The code length is not allowed by the active policy.
    #[error("Security code must be {min}-{max} digits long (got {actual})")]
    CodeWrongLength {
        /// Shortest accepted length.
        min: usize,
        /// Longest accepted length.
        max: usize,
        /// Length that was submitted.
        actual: usize,
    },

    /// The check-in interval is outside 1..=60 minutes.
    #[error("Check interval must be between 1 and 60 minutes (got {0})")]
    IntervalOutOfRange(u32),
}

/// Error type for credential store operations.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The credential could not be persisted or restored.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted credential record is unreadable.
    #[error("Corrupt credential record: {0}")]
    Corrupt(String),
}

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;
