//! Verification session: one code prompt.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Prompting -> Verified
//!                   -> TimedOut (Timeout | WrongCodeExhausted)
//!                   -> Idle     (UserCanceled)
//! ```
//!
//! The session has no side effects beyond its own state; it reports what
//! happened and the engine decides whether to reschedule or escalate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CheckInError, Result};
use crate::credential::CredentialStore;
use crate::escalation::AlertReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Prompting,
    Verified,
    TimedOut,
}

impl SessionState {
    /// Returns whether the session has reached a verdict.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::TimedOut)
    }
}

/// Result of a single code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// Correct code; the session is verified.
    #[serde(rename_all = "camelCase")]
    Verified { verified_at: DateTime<Utc> },
    /// Wrong code; the prompt stays open.
    #[serde(rename_all = "camelCase")]
    Rejected { attempts_remaining: u32 },
    /// Wrong code and no attempts left; the session timed out.
    Exhausted,
    /// The countdown had already run out; the code was not compared.
    Expired,
}

/// Per-cycle verification prompt.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    state: SessionState,
    max_attempts: u32,
    countdown: Duration,
    attempts_made: u32,
    opened_at: Option<DateTime<Utc>>,
    deadline: Option<DateTime<Utc>>,
    last_verified_at: Option<DateTime<Utc>>,
    end_reason: Option<AlertReason>,
}

impl VerificationSession {
    /// Creates an idle session. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, countdown: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            max_attempts: max_attempts.max(1),
            countdown,
            attempts_made: 0,
            opened_at: None,
            deadline: None,
            last_verified_at: None,
            end_reason: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_prompting(&self) -> bool {
        self.state == SessionState::Prompting
    }

    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts_made)
    }

    /// When the open prompt's countdown runs out.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    #[must_use]
    pub const fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    #[must_use]
    pub const fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.last_verified_at
    }

    /// Why the last prompt ended without verification, if it did.
    #[must_use]
    pub const fn end_reason(&self) -> Option<AlertReason> {
        self.end_reason
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Opens a prompt: resets attempts and starts the countdown.
    /// Returns the countdown deadline.
    pub fn open(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let deadline = now + self.countdown;
        self.state = SessionState::Prompting;
        self.attempts_made = 0;
        self.opened_at = Some(now);
        self.deadline = Some(deadline);
        self.end_reason = None;
        deadline
    }

    /// Checks a candidate code.
    ///
    /// A submission at or after the deadline expires the session instead of
    /// being compared.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotPrompting`] when no prompt is open.
    pub fn submit(
        &mut self,
        candidate: &str,
        credentials: &CredentialStore,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        if !self.is_prompting() {
            return Err(CheckInError::NotPrompting);
        }

        if self.expire(now) {
            return Ok(SubmitOutcome::Expired);
        }

        if credentials.compare(candidate) {
            self.state = SessionState::Verified;
            self.last_verified_at = Some(now);
            self.deadline = None;
            return Ok(SubmitOutcome::Verified { verified_at: now });
        }

        self.attempts_made = (self.attempts_made + 1).min(self.max_attempts);
        if self.attempts_made >= self.max_attempts {
            self.time_out(AlertReason::WrongCodeExhausted);
            return Ok(SubmitOutcome::Exhausted);
        }

        Ok(SubmitOutcome::Rejected {
            attempts_remaining: self.attempts_remaining(),
        })
    }

    /// Times the prompt out if its countdown has run out at `now`.
    /// Returns whether the session transitioned.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        let overdue = self.deadline.is_some_and(|deadline| now >= deadline);
        if self.is_prompting() && overdue {
            self.time_out(AlertReason::Timeout);
            return true;
        }
        false
    }

    /// Closes an open prompt without a verdict. Returns whether a prompt
    /// was open.
    pub fn cancel(&mut self) -> bool {
        if !self.is_prompting() {
            return false;
        }
        self.state = SessionState::Idle;
        self.deadline = None;
        self.end_reason = Some(AlertReason::UserCanceled);
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn time_out(&mut self, reason: AlertReason) {
        self.state = SessionState::TimedOut;
        self.deadline = None;
        self.end_reason = Some(reason);
    }
}
