//! Check-in cycle types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one check-in cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CycleStatus {
    /// Waiting for the deadline.
    Pending,
    /// The verification prompt is open.
    AwaitingVerification,
    /// The traveller entered the right code in time.
    Confirmed,
    /// The prompt timed out or the attempts ran out.
    Missed,
}

impl CycleStatus {
    /// Returns whether the cycle is finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Missed)
    }
}

/// One interval-bounded period ending in a verification prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInCycle {
    /// Sequence number, unique per scheduler.
    pub id: u64,
    /// Start of the interval.
    pub scheduled_at: DateTime<Utc>,
    /// When the prompt opens (`scheduled_at + interval`).
    pub deadline: DateTime<Utc>,
    /// Current status.
    pub status: CycleStatus,
    /// Wrong codes entered during this cycle's prompt.
    pub attempts_made: u32,
}

impl CheckInCycle {
    /// Creates a pending cycle.
    #[must_use]
    pub fn pending(id: u64, scheduled_at: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            id,
            scheduled_at,
            deadline: scheduled_at + interval,
            status: CycleStatus::Pending,
            attempts_made: 0,
        }
    }

    /// Returns whether the prompt for this cycle is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == CycleStatus::Pending && now >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_cycle_deadline_is_start_plus_interval() {
        let start = Utc::now();
        let cycle = CheckInCycle::pending(1, start, Duration::minutes(5));
        assert_eq!(cycle.deadline, start + Duration::minutes(5));
        assert_eq!(cycle.status, CycleStatus::Pending);
        assert!(!cycle.is_due(start));
        assert!(cycle.is_due(start + Duration::minutes(5)));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!CycleStatus::Pending.is_terminal());
        assert!(!CycleStatus::AwaitingVerification.is_terminal());
        assert!(CycleStatus::Confirmed.is_terminal());
        assert!(CycleStatus::Missed.is_terminal());
    }

    #[test]
    fn status_json_is_camel_case() {
        let json = serde_json::to_string(&CycleStatus::AwaitingVerification).unwrap();
        assert_eq!(json, "\"awaitingVerification\"");
    }
}
