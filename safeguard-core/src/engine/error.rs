//! Error types for engine operations.

use thiserror::Error;

use crate::checkin::CheckInError;
use crate::config::ConfigError;
use crate::credential::CredentialError;

/// Error type for [`SafetyEngine`](super::SafetyEngine) operations.
///
/// Every variant is a precondition or input failure reported to the caller;
/// none of them stops a running engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Arming, disarming or a code submission in the wrong state.
    #[error("Check-in error: {0}")]
    CheckIn(#[from] CheckInError),

    /// `arm` needs at least one emergency contact.
    #[error("No emergency contacts configured")]
    NoContactsConfigured,

    /// `arm` needs a security code.
    #[error("No security code configured")]
    NoCredentialConfigured,

    /// Setting or restoring the credential failed.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The engine configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Returns whether this is the "already armed" guard.
    #[must_use]
    pub const fn is_already_armed(&self) -> bool {
        matches!(self, Self::CheckIn(CheckInError::AlreadyArmed))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
