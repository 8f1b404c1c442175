//! Error types for contact management.

use thiserror::Error;

use crate::storage::StorageError;

/// Error type for contact operations.
#[derive(Error, Debug)]
pub enum ContactError {
    /// Contact name is blank.
    #[error("Invalid contact: name is required")]
    EmptyName,

    /// Phone number fails validation.
    #[error("Invalid contact phone: {0}")]
    InvalidPhone(String),

    /// No contact with the given id.
    #[error("Contact not found: {0}")]
    NotFound(String),

    /// The directory could not be persisted or restored.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for contact operations.
pub type Result<T> = std::result::Result<T, ContactError>;
