//! Engine status and tracking session records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::checkin::{CheckInCycle, SchedulerState, SessionState};
use crate::location::LocationSample;

/// One arm-to-disarm span, kept in a bounded history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    /// Random `session-` prefixed identifier.
    pub id: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is running.
    pub ended_at: Option<DateTime<Utc>>,
    pub cycles_confirmed: u32,
    pub cycles_missed: u32,
    /// Escalations handed to the dispatcher, throttled ones included.
    pub alerts_triggered: u32,
    pub location_points: u32,
}

impl TrackingSession {
    pub(crate) fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: format!("session-{}", hex::encode(rand::random::<[u8; 4]>())),
            started_at: now,
            ended_at: None,
            cycles_confirmed: 0,
            cycles_missed: 0,
            alerts_triggered: 0,
            location_points: 0,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Length of a finished session.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Snapshot of the engine for status screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub scheduler_state: SchedulerState,
    pub session_state: SessionState,
    pub credential_configured: bool,
    pub interval_minutes: Option<u32>,
    pub code_length: Option<usize>,
    pub current_cycle: Option<CheckInCycle>,
    /// When the next prompt opens, if a cycle is pending.
    pub next_due_at: Option<DateTime<Utc>>,
    /// When the open prompt times out.
    pub verification_deadline: Option<DateTime<Utc>>,
    /// Wrong codes still allowed, while a prompt is open.
    pub attempts_remaining: Option<u32>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub cycles_confirmed: u32,
    pub cycles_missed: u32,
    pub tracking: Option<TrackingSession>,
    pub latest_location: Option<LocationSample>,
}

impl EngineStatus {
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.scheduler_state == SchedulerState::Armed
    }

    #[must_use]
    pub fn is_prompting(&self) -> bool {
        self.session_state == SessionState::Prompting
    }
}
