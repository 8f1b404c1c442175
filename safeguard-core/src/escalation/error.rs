//! Error types for alert delivery.

use thiserror::Error;

/// Failure reported by a [`NotificationTransport`](super::NotificationTransport).
///
/// Transport errors are recorded on the alert as `Failed` and never retried
/// by the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The delivery service refused the message.
    #[error("Transport error: rejected: {0}")]
    Rejected(String),

    /// The delivery service could not be reached.
    #[error("Transport error: unreachable: {0}")]
    Unreachable(String),
}
