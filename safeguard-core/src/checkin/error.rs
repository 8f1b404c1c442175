//! Error types for check-in state transitions.

use thiserror::Error;

/// Precondition failures of the scheduler and verification session.
/// These are reported to the caller and never change state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInError {
    /// `arm` was called on a running scheduler.
    #[error("Check-ins are already armed")]
    AlreadyArmed,

    /// The operation requires an armed scheduler.
    #[error("Check-ins are not armed")]
    NotArmed,

    /// No cycle is waiting to be opened.
    #[error("No pending check-in cycle")]
    NoPendingCycle,

    /// No cycle is waiting on a verification result.
    #[error("No check-in cycle is awaiting verification")]
    NotAwaitingVerification,

    /// A code was submitted while no prompt is open.
    #[error("No verification prompt is open")]
    NotPrompting,
}

/// Result type alias for check-in operations.
pub type Result<T> = std::result::Result<T, CheckInError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_armed_display() {
        assert_eq!(
            CheckInError::AlreadyArmed.to_string(),
            "Check-ins are already armed"
        );
    }

    #[test]
    fn not_prompting_display() {
        assert_eq!(
            CheckInError::NotPrompting.to_string(),
            "No verification prompt is open"
        );
    }
}
