//! Alert records and the alert message format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::EmergencyContact;
use crate::location::{LocationSample, ALERT_GEOHASH_PRECISION};

/// Why an escalation was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertReason {
    /// The countdown ran out without a correct code.
    Timeout,
    /// Too many wrong codes in one prompt.
    WrongCodeExhausted,
    /// The user dismissed the prompt and the deployment escalates on cancel.
    UserCanceled,
    /// No position was available when the alert was built.
    LocationLost,
    /// The user raised the alarm directly.
    Manual,
}

impl AlertReason {
    /// Returns the identifier used in logs and JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::WrongCodeExhausted => "wrongCodeExhausted",
            Self::UserCanceled => "userCanceled",
            Self::LocationLost => "locationLost",
            Self::Manual => "manual",
        }
    }

    /// Parses an identifier produced by [`AlertReason::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "timeout" => Some(Self::Timeout),
            "wrongCodeExhausted" => Some(Self::WrongCodeExhausted),
            "userCanceled" => Some(Self::UserCanceled),
            "locationLost" => Some(Self::LocationLost),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Text shown to recipients in the alert message.
    #[must_use]
    pub const fn message_text(&self) -> &'static str {
        match self {
            Self::Timeout => "No response to safety check",
            Self::WrongCodeExhausted => "Multiple incorrect code entries",
            Self::UserCanceled => "User canceled verification",
            Self::LocationLost => "Location unavailable",
            Self::Manual => "Emergency button pressed",
        }
    }
}

/// Reason text carried by test alerts in place of [`AlertReason::message_text`].
pub const TEST_ALERT_TEXT: &str = "TEST ALERT - Please ignore";

/// Delivery state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchStatus {
    Queued,
    Sent,
    Failed,
}

/// One emergency alert, as broadcast and as kept in the alert history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Random `alert-` prefixed identifier.
    pub id: String,
    /// When the escalation was raised.
    pub timestamp: DateTime<Utc>,
    pub reason: AlertReason,
    /// Secondary condition, e.g. [`AlertReason::LocationLost`].
    pub annotation: Option<AlertReason>,
    pub location_snapshot: Option<LocationSample>,
    pub recipients: Vec<EmergencyContact>,
    pub message: String,
    pub dispatch_status: DispatchStatus,
    /// Whose check-in lapsed.
    pub owner_id: String,
    /// Set on alerts sent to check the contact setup.
    #[serde(default)]
    pub is_test: bool,
}

impl AlertEvent {
    /// Geohash cell of the snapshot, if there is one.
    #[must_use]
    pub fn location_geohash(&self) -> Option<String> {
        self.location_snapshot
            .as_ref()
            .map(|sample| sample.geohash(ALERT_GEOHASH_PRECISION))
    }
}

/// Builds the text sent to emergency contacts.
#[must_use]
pub fn build_alert_message(reason: AlertReason, location: Option<&LocationSample>) -> String {
    compose_message(reason.message_text(), location)
}

/// Builds the text of a test alert.
#[must_use]
pub fn build_test_message(location: Option<&LocationSample>) -> String {
    compose_message(TEST_ALERT_TEXT, location)
}

fn compose_message(text: &str, location: Option<&LocationSample>) -> String {
    location.map_or_else(
        || format!("EMERGENCY ALERT: {text}. Location: Unknown location"),
        |sample| {
            format!(
                "EMERGENCY ALERT: {text}. Location: {} View map: {}",
                sample.coordinates_text(),
                sample.map_url()
            )
        },
    )
}

pub(crate) fn new_alert_id() -> String {
    format!("alert-{}", hex::encode(rand::random::<[u8; 4]>()))
}
