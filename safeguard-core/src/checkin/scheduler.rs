//! Check-in scheduler.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Armed -> (Pending -> AwaitingVerification -> Confirmed | Missed)* -> Stopped
//! ```
//!
//! The scheduler only decides *when* checks are due. It never sleeps; the
//! engine installs a timer for [`CheckInScheduler::next_due_at`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CheckInError, Result};
use super::types::{CheckInCycle, CycleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Armed,
}

/// Decides when the next verification is due.
///
/// Holds at most one active cycle, so two prompts can never be open for the
/// same credential.
#[derive(Debug, Clone)]
pub struct CheckInScheduler {
    state: SchedulerState,
    interval: Duration,
    current: Option<CheckInCycle>,
    next_cycle_id: u64,
    last_verified_at: Option<DateTime<Utc>>,
    cycles_confirmed: u32,
    cycles_missed: u32,
}

impl Default for CheckInScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckInScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SchedulerState::Stopped,
            interval: Duration::zero(),
            current: None,
            next_cycle_id: 1,
            last_verified_at: None,
            cycles_confirmed: 0,
            cycles_missed: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == SchedulerState::Armed
    }

    #[must_use]
    pub const fn current(&self) -> Option<&CheckInCycle> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.last_verified_at
    }

    #[must_use]
    pub const fn cycles_confirmed(&self) -> u32 {
        self.cycles_confirmed
    }

    #[must_use]
    pub const fn cycles_missed(&self) -> u32 {
        self.cycles_missed
    }

    /// When the pending cycle's prompt should open.
    #[must_use]
    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.current
            .as_ref()
            .filter(|cycle| cycle.status == CycleStatus::Pending)
            .map(|cycle| cycle.deadline)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Starts the cycle loop and schedules the first check.
    ///
    /// Without a previous verification the check is due at `now + interval`.
    /// With one, it is due at `last_verified_at + interval`, or immediately
    /// when that moment has already passed (e.g. the process was suspended).
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::AlreadyArmed`] if already running.
    pub fn arm(
        &mut self,
        interval: Duration,
        now: DateTime<Utc>,
        last_verified_at: Option<DateTime<Utc>>,
    ) -> Result<CheckInCycle> {
        if self.is_armed() {
            return Err(CheckInError::AlreadyArmed);
        }

        self.state = SchedulerState::Armed;
        self.interval = interval;
        self.last_verified_at = last_verified_at;
        self.cycles_confirmed = 0;
        self.cycles_missed = 0;

        let start = last_verified_at.map_or(now, |last| {
            // Never extend the safety window, never schedule in the past.
            let earliest = now - interval;
            if last < earliest {
                earliest
            } else {
                last.min(now)
            }
        });
        Ok(self.schedule_from(start))
    }

    /// Stops the loop, discarding the active cycle without marking it missed.
    pub fn disarm(&mut self) -> Option<CheckInCycle> {
        self.state = SchedulerState::Stopped;
        self.current.take()
    }

    /// Moves the pending cycle to `AwaitingVerification`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotArmed`] or [`CheckInError::NoPendingCycle`].
    pub fn begin_verification(&mut self) -> Result<CheckInCycle> {
        self.ensure_armed()?;
        let cycle = self
            .current
            .as_mut()
            .filter(|cycle| cycle.status == CycleStatus::Pending)
            .ok_or(CheckInError::NoPendingCycle)?;
        cycle.status = CycleStatus::AwaitingVerification;
        cycle.attempts_made = 0;
        Ok(cycle.clone())
    }

    /// Mirrors the session's attempt count onto the awaiting cycle.
    pub fn record_attempts(&mut self, attempts_made: u32) {
        if let Some(cycle) = self
            .current
            .as_mut()
            .filter(|cycle| cycle.status == CycleStatus::AwaitingVerification)
        {
            cycle.attempts_made = attempts_made;
        }
    }

    /// Marks the awaiting cycle confirmed and schedules the next one at
    /// `now + interval`. Returns `(confirmed, next)`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotArmed`] or
    /// [`CheckInError::NotAwaitingVerification`].
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(CheckInCycle, CheckInCycle)> {
        let finished = self.finish(CycleStatus::Confirmed)?;
        self.last_verified_at = Some(now);
        self.cycles_confirmed += 1;
        Ok((finished, self.schedule_from(now)))
    }

    /// Marks the awaiting cycle missed and resumes at `now + interval`;
    /// an alert never stops tracking. Returns `(missed, next)`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotArmed`] or
    /// [`CheckInError::NotAwaitingVerification`].
    pub fn miss(&mut self, now: DateTime<Utc>) -> Result<(CheckInCycle, CheckInCycle)> {
        let finished = self.finish(CycleStatus::Missed)?;
        self.cycles_missed += 1;
        Ok((finished, self.schedule_from(now)))
    }

    /// Drops the awaiting cycle without a verdict (the traveller dismissed
    /// the prompt) and schedules the next one at `now + interval`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotArmed`] or
    /// [`CheckInError::NotAwaitingVerification`].
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<CheckInCycle> {
        self.ensure_armed()?;
        if !self.is_awaiting() {
            return Err(CheckInError::NotAwaitingVerification);
        }
        Ok(self.schedule_from(now))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_armed(&self) -> Result<()> {
        if self.is_armed() {
            Ok(())
        } else {
            Err(CheckInError::NotArmed)
        }
    }

    fn is_awaiting(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|cycle| cycle.status == CycleStatus::AwaitingVerification)
    }

    fn finish(&mut self, status: CycleStatus) -> Result<CheckInCycle> {
        self.ensure_armed()?;
        let cycle = self
            .current
            .as_mut()
            .filter(|cycle| cycle.status == CycleStatus::AwaitingVerification)
            .ok_or(CheckInError::NotAwaitingVerification)?;
        cycle.status = status;
        Ok(cycle.clone())
    }

    fn schedule_from(&mut self, start: DateTime<Utc>) -> CheckInCycle {
        let cycle = CheckInCycle::pending(self.next_cycle_id, start, self.interval);
        self.next_cycle_id += 1;
        self.current = Some(cycle.clone());
        cycle
    }
}
