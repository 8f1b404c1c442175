//! Alert construction, throttling and delivery.

// The dispatch lock is held across the location fetch and the transport
// call so concurrent escalations are serialized through the throttle.
#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;

use super::transport::NotificationTransport;
use super::types::{
    build_alert_message, build_test_message, new_alert_id, AlertEvent, AlertReason,
    DispatchStatus,
};
use crate::clock::Clock;
use crate::contact::{ContactDirectory, EmergencyContact};
use crate::events::{EngineEvent, UiSink};
use crate::history::BoundedHistory;
use crate::location::LocationTracker;
use crate::storage::{load_json, save_json, Persistence, KEY_ALERT_HISTORY};

/// Tunables for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Minimum spacing between two dispatched alerts.
    pub min_interval: Duration,
    /// How long to wait for a fresh position fix.
    pub location_grace: std::time::Duration,
    /// Alert history length.
    pub history_cap: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::seconds(60),
            location_grace: std::time::Duration::from_millis(10_000),
            history_cap: 50,
        }
    }
}

struct DispatchState {
    history: BoundedHistory<AlertEvent>,
    last_alert: Option<AlertEvent>,
}

/// Builds and broadcasts emergency alerts.
///
/// Escalations closer together than [`DispatcherSettings::min_interval`]
/// return the previous alert without dispatching again. Every dispatched
/// alert, failed or not, is appended to a bounded history persisted under
/// `alertHistory`.
pub struct EscalationDispatcher {
    clock: Arc<dyn Clock>,
    location: Arc<LocationTracker>,
    contacts: Arc<dyn ContactDirectory>,
    transport: Arc<dyn NotificationTransport>,
    persistence: Arc<dyn Persistence>,
    sink: Option<Arc<dyn UiSink>>,
    settings: DispatcherSettings,
    state: Mutex<DispatchState>,
}

impl std::fmt::Debug for EscalationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationDispatcher")
            .field("settings", &self.settings)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl EscalationDispatcher {
    /// Creates a dispatcher, restoring the persisted alert history.
    ///
    /// A corrupt persisted history is discarded with a warning. The throttle
    /// starts open: only alerts raised by this instance count towards it.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        location: Arc<LocationTracker>,
        contacts: Arc<dyn ContactDirectory>,
        transport: Arc<dyn NotificationTransport>,
        persistence: Arc<dyn Persistence>,
        settings: DispatcherSettings,
    ) -> Self {
        let restored: Vec<AlertEvent> = match load_json(persistence.as_ref(), KEY_ALERT_HISTORY) {
            Ok(events) => events.unwrap_or_default(),
            Err(e) => {
                log::warn!("Discarding unreadable alert history: {e}");
                Vec::new()
            }
        };

        Self {
            clock,
            location,
            contacts,
            transport,
            persistence,
            sink: None,
            settings,
            state: Mutex::new(DispatchState {
                history: BoundedHistory::from_entries(restored, settings.history_cap),
                last_alert: None,
            }),
        }
    }

    /// Reports dispatched alerts to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Option<Arc<dyn UiSink>>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Raises an alert for `owner_id`.
    ///
    /// Returns the previous alert unchanged when it is younger than the
    /// minimum interval. Otherwise snapshots the location, sends the message
    /// to every contact and records the result.
    pub async fn escalate(&self, reason: AlertReason, owner_id: &str) -> AlertEvent {
        self.dispatch(reason, owner_id, false).await
    }

    /// Sends a test alert to every contact.
    ///
    /// Test alerts are not throttled and do not count towards the throttle,
    /// so a test never holds back a real alert. They are kept in the history
    /// with `is_test` set.
    pub async fn send_test_alert(&self, owner_id: &str) -> AlertEvent {
        self.dispatch(AlertReason::Manual, owner_id, true).await
    }

    /// Alert history, oldest first.
    pub async fn history(&self) -> Vec<AlertEvent> {
        self.state.lock().await.history.to_vec()
    }

    /// Most recent real alert raised by this dispatcher.
    pub async fn last_alert(&self) -> Option<AlertEvent> {
        self.state.lock().await.last_alert.clone()
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn dispatch(&self, reason: AlertReason, owner_id: &str, is_test: bool) -> AlertEvent {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if !is_test {
            if let Some(previous) = &state.last_alert {
                let since = now - previous.timestamp;
                if since < self.settings.min_interval {
                    log::info!(
                        "Alert throttled: {} raised {}s ago",
                        previous.id,
                        since.num_seconds()
                    );
                    return previous.clone();
                }
            }
        }

        if is_test {
            log::info!("Sending test alert");
        } else {
            log::warn!("Escalating: {}", reason.message_text());
        }

        let location_snapshot = self.location.snapshot(self.settings.location_grace).await;
        if location_snapshot.is_none() {
            log::warn!("No location available for alert");
        }
        let recipients = self.contacts.list_contacts();
        let message = if is_test {
            build_test_message(location_snapshot.as_ref())
        } else {
            build_alert_message(reason, location_snapshot.as_ref())
        };

        let mut event = AlertEvent {
            id: new_alert_id(),
            timestamp: now,
            reason,
            annotation: location_snapshot
                .is_none()
                .then_some(AlertReason::LocationLost),
            location_snapshot,
            recipients,
            message,
            dispatch_status: DispatchStatus::Queued,
            owner_id: owner_id.to_string(),
            is_test,
        };
        event.dispatch_status = self.deliver(&event.message, &event.recipients).await;
        log::info!(
            "Alert {} {:?}; location cell {}",
            event.id,
            event.dispatch_status,
            event.location_geohash().as_deref().unwrap_or("unknown")
        );

        state.history.push(event.clone());
        if let Err(e) = save_json(self.persistence.as_ref(), KEY_ALERT_HISTORY, &state.history) {
            log::warn!("Failed to persist alert history: {e}");
        }
        if !is_test {
            state.last_alert = Some(event.clone());
        }
        drop(state);

        if let Some(sink) = &self.sink {
            sink.notify(&EngineEvent::Escalated {
                alert: event.clone(),
            });
        }
        event
    }

    async fn deliver(&self, message: &str, recipients: &[EmergencyContact]) -> DispatchStatus {
        if recipients.is_empty() {
            log::warn!("No emergency contacts configured; alert not sent");
            return DispatchStatus::Failed;
        }

        match self.transport.send(message, recipients).await {
            Ok(receipt) => {
                log::info!("Alert sent to {} contacts", receipt.delivered);
                DispatchStatus::Sent
            }
            Err(e) => {
                log::warn!("Alert dispatch failed: {e}");
                DispatchStatus::Failed
            }
        }
    }
}
