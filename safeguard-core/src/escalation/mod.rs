//! Emergency escalation.
//!
//! When a check-in lapses, the engine hands an [`AlertReason`] to the
//! [`EscalationDispatcher`], which:
//!
//! 1. drops the request if an alert went out less than a minute ago
//! 2. takes the best available location snapshot
//! 3. formats the alert message and sends it to every emergency contact
//! 4. appends the resulting [`AlertEvent`] to the bounded alert history
//!
//! The same path serves the manual emergency trigger. Test alerts skip
//! step 1 and never hold back a real alert.

mod dispatcher;
mod error;
mod transport;
pub mod types;

pub use dispatcher::{DispatcherSettings, EscalationDispatcher};
pub use error::TransportError;
pub use transport::{DispatchReceipt, LoggingTransport, NotificationTransport};
pub use types::{
    build_alert_message, build_test_message, AlertEvent, AlertReason, DispatchStatus,
    TEST_ALERT_TEXT,
};
