//! Alert delivery seam.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::error::TransportError;
use crate::contact::EmergencyContact;

/// Acknowledgement from a transport that accepted an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReceipt {
    /// How many recipients the transport handed the message to.
    pub delivered: usize,
    pub accepted_at: DateTime<Utc>,
}

/// Delivers alert messages to emergency contacts.
///
/// The engine calls `send` once per alert with the full ordered recipient
/// list and never retries.
pub trait NotificationTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        message: &'a str,
        recipients: &'a [EmergencyContact],
    ) -> BoxFuture<'a, Result<DispatchReceipt, TransportError>>;
}

/// Transport that only writes the alert to the log.
///
/// Stands in for an SMS or push gateway in demos and local runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTransport;

impl NotificationTransport for LoggingTransport {
    fn send<'a>(
        &'a self,
        message: &'a str,
        recipients: &'a [EmergencyContact],
    ) -> BoxFuture<'a, Result<DispatchReceipt, TransportError>> {
        Box::pin(async move {
            for contact in recipients {
                log::info!("Alert for {} ({}): {message}", contact.name, contact.phone);
            }
            Ok(DispatchReceipt {
                delivered: recipients.len(),
                accepted_at: Utc::now(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Relation;

    #[tokio::test]
    async fn logging_transport_accepts_everyone() {
        let recipients = vec![EmergencyContact {
            id: "contact-000001".to_string(),
            name: "Asha".to_string(),
            phone: "+91 98765 43210".to_string(),
            relation: Relation::Family,
            is_primary: true,
        }];

        let receipt = LoggingTransport
            .send("EMERGENCY ALERT: test", &recipients)
            .await
            .unwrap();

        assert_eq!(receipt.delivered, 1);
    }
}
