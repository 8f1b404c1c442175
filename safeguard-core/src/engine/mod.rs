//! The safety engine: one explicit owner for check-in state and timers.
//!
//! # Architecture
//!
//! ```text
//! SafetyEngine (cheap to clone)
//!     └── Arc<EngineInner>
//!         ├── Mutex<EngineState>
//!         │   ├── CredentialStore
//!         │   ├── CheckInScheduler ── check-in timer
//!         │   ├── VerificationSession ── countdown timer
//!         │   └── TrackingSession (+ bounded history)
//!         ├── LocationTracker
//!         └── EscalationDispatcher (spawned per lapse)
//! ```
//!
//! Every mutation, whether from a caller or a timer, goes through the state
//! mutex, so the scheduler and session always change together. Timer tasks
//! hold a `Weak` reference and carry a generation number; a timer that fires
//! after it was replaced or cancelled finds a newer generation and does
//! nothing. Dropping the last engine handle aborts all timers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use safeguard_core::{
//!     Collaborators, EngineConfig, LoggingTransport, MemoryContactDirectory,
//!     MemoryPersistence, NewContact, Relation, SafetyEngine,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let persistence = Arc::new(MemoryPersistence::new());
//! let contacts = Arc::new(MemoryContactDirectory::load(persistence.clone())?);
//! contacts.add(NewContact::new("Asha", "+91 98765 43210", Relation::Family))?;
//!
//! let engine = SafetyEngine::new(
//!     EngineConfig::default(),
//!     Collaborators::new(persistence, contacts, Arc::new(LoggingTransport)),
//! )?;
//! engine.set_credential("4242", 5).await?;
//! engine.arm().await?;
//! # Ok(())
//! # }
//! ```

// The state lock is held for the whole of each transition.
#![allow(clippy::significant_drop_tightening)]

mod error;
mod timer;
pub mod types;

pub use error::{EngineError, Result};
pub use types::{EngineStatus, TrackingSession};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use self::timer::TimerHandle;
use crate::checkin::{
    CheckInCycle, CheckInError, CheckInScheduler, SubmitOutcome, VerificationSession,
};
use crate::clock::{delay_until, Clock, TokioClock};
use crate::config::EngineConfig;
use crate::contact::ContactDirectory;
use crate::credential::CredentialStore;
use crate::escalation::{AlertEvent, AlertReason, EscalationDispatcher, NotificationTransport};
use crate::events::{EngineEvent, UiSink};
use crate::history::BoundedHistory;
use crate::location::{LocationProvider, LocationSample, LocationTracker};
use crate::storage::{
    load_json, save_json, Persistence, KEY_LAST_VERIFIED, KEY_TRACKING_SESSIONS,
};

/// External services the engine talks to.
///
/// `persistence`, `contacts` and `transport` are required. Without a
/// location provider alerts fall back to the recorded trail; the clock
/// defaults to [`TokioClock`]; the UI sink is optional.
pub struct Collaborators {
    pub persistence: Arc<dyn Persistence>,
    pub contacts: Arc<dyn ContactDirectory>,
    pub transport: Arc<dyn NotificationTransport>,
    pub location: Option<Arc<dyn LocationProvider>>,
    pub clock: Arc<dyn Clock>,
    pub sink: Option<Arc<dyn UiSink>>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        persistence: Arc<dyn Persistence>,
        contacts: Arc<dyn ContactDirectory>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            persistence,
            contacts,
            transport,
            location: None,
            clock: Arc::new(TokioClock::new()),
            sink: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(provider);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn UiSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

/// Check-in verification and escalation engine.
///
/// Must be used from within a tokio runtime: arming and every transition
/// after it spawn timer and dispatch tasks.
#[derive(Clone)]
pub struct SafetyEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for SafetyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyEngine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

struct EngineInner {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    persistence: Arc<dyn Persistence>,
    contacts: Arc<dyn ContactDirectory>,
    sink: Option<Arc<dyn UiSink>>,
    location: Arc<LocationTracker>,
    dispatcher: Arc<EscalationDispatcher>,
    state: Mutex<EngineState>,
}

struct EngineState {
    credentials: CredentialStore,
    scheduler: CheckInScheduler,
    session: VerificationSession,
    checkin_timer: Option<TimerHandle>,
    countdown_timer: Option<TimerHandle>,
    checkin_generation: u64,
    countdown_generation: u64,
    tracking: Option<TrackingSession>,
    tracking_history: BoundedHistory<TrackingSession>,
    dispatches: Vec<JoinHandle<AlertEvent>>,
}

impl SafetyEngine {
    /// Creates a stopped engine, restoring the credential, alert history,
    /// location trail and tracking history from persistence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid configuration and
    /// [`EngineError::Credential`] if a persisted credential is unreadable.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            persistence,
            contacts,
            transport,
            location,
            clock,
            sink,
        } = collaborators;

        let mut credentials = CredentialStore::new(config.code_policy, persistence.clone());
        credentials.load()?;

        let location = Arc::new(LocationTracker::new(
            location,
            persistence.clone(),
            config.location_trail_cap,
        ));
        let dispatcher = Arc::new(
            EscalationDispatcher::new(
                clock.clone(),
                location.clone(),
                contacts.clone(),
                transport,
                persistence.clone(),
                config.dispatcher_settings(),
            )
            .with_sink(sink.clone()),
        );

        let restored: Vec<TrackingSession> =
            match load_json(persistence.as_ref(), KEY_TRACKING_SESSIONS) {
                Ok(sessions) => sessions.unwrap_or_default(),
                Err(e) => {
                    log::warn!("Discarding unreadable tracking history: {e}");
                    Vec::new()
                }
            };

        let state = EngineState {
            credentials,
            scheduler: CheckInScheduler::new(),
            session: VerificationSession::new(config.max_attempts, config.countdown()),
            checkin_timer: None,
            countdown_timer: None,
            checkin_generation: 0,
            countdown_generation: 0,
            tracking: None,
            tracking_history: BoundedHistory::from_entries(restored, config.tracking_history_cap),
            dispatches: Vec::new(),
        };

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                clock,
                persistence,
                contacts,
                sink,
                location,
                dispatcher,
                state: Mutex::new(state),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current time on the engine's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Installs a new security code and check-in interval.
    ///
    /// Setting a code counts as a verification, so the first check after
    /// arming is a full interval away from the setup.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::AlreadyArmed`] while check-ins are running
    /// and [`EngineError::Credential`] for invalid input.
    pub async fn set_credential(&self, code: &str, interval_minutes: u32) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.scheduler.is_armed() {
            return Err(CheckInError::AlreadyArmed.into());
        }
        state.credentials.set_credential(code, interval_minutes)?;
        self.inner.persist_last_verified(self.inner.clock.now());
        Ok(())
    }

    /// Forgets the security code and the last verification time.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::AlreadyArmed`] while check-ins are running.
    pub async fn clear_credential(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.scheduler.is_armed() {
            return Err(CheckInError::AlreadyArmed.into());
        }
        state.credentials.clear()?;
        if let Err(e) = self.inner.persistence.remove(KEY_LAST_VERIFIED) {
            log::warn!("Failed to remove last verification time: {e}");
        }
        log::info!("Security code cleared");
        Ok(())
    }

    /// Starts check-ins and schedules the first verification.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::AlreadyArmed`] if running,
    /// [`EngineError::NoCredentialConfigured`] without a code and
    /// [`EngineError::NoContactsConfigured`] without contacts.
    pub async fn arm(&self) -> Result<CheckInCycle> {
        let inner = &self.inner;
        let mut guard = inner.state.lock().await;
        let state = &mut *guard;

        if state.scheduler.is_armed() {
            return Err(CheckInError::AlreadyArmed.into());
        }
        let interval = state
            .credentials
            .interval()
            .ok_or(EngineError::NoCredentialConfigured)?;
        if inner.contacts.list_contacts().is_empty() {
            return Err(EngineError::NoContactsConfigured);
        }

        let now = inner.clock.now();
        let cycle = state
            .scheduler
            .arm(interval, now, inner.load_last_verified())?;
        state.tracking = Some(TrackingSession::start(now));
        inner.schedule_checkin(state, &cycle);

        log::info!("Check-ins armed; first check due at {}", cycle.deadline);
        inner.emit(&EngineEvent::Armed {
            next_due_at: cycle.deadline,
        });
        inner.emit(&EngineEvent::CycleScheduled {
            cycle_id: cycle.id,
            due_at: cycle.deadline,
        });
        Ok(cycle)
    }

    /// Stops check-ins. An open prompt is discarded without an alert.
    ///
    /// Returns the finished tracking session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotArmed`] if check-ins are not running.
    pub async fn disarm(&self) -> Result<TrackingSession> {
        let inner = &self.inner;
        let mut guard = inner.state.lock().await;
        let state = &mut *guard;

        if !state.scheduler.is_armed() {
            return Err(CheckInError::NotArmed.into());
        }

        state.cancel_countdown();
        state.checkin_timer = None;
        state.checkin_generation += 1;
        if state.session.cancel() {
            inner.emit(&EngineEvent::VerificationCanceled);
        }
        state.scheduler.disarm();

        let now = inner.clock.now();
        let mut finished = state
            .tracking
            .take()
            .unwrap_or_else(|| TrackingSession::start(now));
        finished.ended_at = Some(now);
        state.tracking_history.push(finished.clone());
        if let Err(e) = save_json(
            inner.persistence.as_ref(),
            KEY_TRACKING_SESSIONS,
            &state.tracking_history,
        ) {
            log::warn!("Failed to persist tracking history: {e}");
        }

        log::info!(
            "Check-ins disarmed after {} confirmed, {} missed",
            finished.cycles_confirmed,
            finished.cycles_missed
        );
        inner.emit(&EngineEvent::Disarmed);
        Ok(finished)
    }

    /// Checks a code against the open prompt.
    ///
    /// A correct code confirms the cycle and schedules the next one. The last
    /// allowed wrong code, or any code after the countdown ran out, escalates.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotPrompting`] when no prompt is open.
    pub async fn submit_code(&self, code: &str) -> Result<SubmitOutcome> {
        let inner = &self.inner;
        let mut guard = inner.state.lock().await;
        let state = &mut *guard;

        let now = inner.clock.now();
        let outcome = state.session.submit(code, &state.credentials, now)?;
        state
            .scheduler
            .record_attempts(state.session.attempts_made());

        match outcome {
            SubmitOutcome::Verified { verified_at } => {
                state.cancel_countdown();
                let (confirmed, next) = state.scheduler.confirm(verified_at)?;
                if let Some(tracking) = state.tracking.as_mut() {
                    tracking.cycles_confirmed += 1;
                }
                inner.persist_last_verified(verified_at);
                inner.schedule_checkin(state, &next);

                log::info!("Check-in {} confirmed; user verified safe", confirmed.id);
                inner.emit(&EngineEvent::VerificationSucceeded { verified_at });
                inner.emit(&EngineEvent::CycleScheduled {
                    cycle_id: next.id,
                    due_at: next.deadline,
                });
            }
            SubmitOutcome::Rejected { attempts_remaining } => {
                log::warn!("Incorrect code. {attempts_remaining} attempts remaining");
                inner.emit(&EngineEvent::VerificationFailed { attempts_remaining });
            }
            SubmitOutcome::Exhausted => {
                log::warn!("Incorrect code. No attempts remaining");
                state.cancel_countdown();
                inner.emit(&EngineEvent::VerificationFailed {
                    attempts_remaining: 0,
                });
                inner.handle_lapse(state, AlertReason::WrongCodeExhausted, now);
            }
            SubmitOutcome::Expired => {
                log::warn!("Code submitted after the countdown ran out");
                state.cancel_countdown();
                inner.handle_lapse(state, AlertReason::Timeout, now);
            }
        }
        Ok(outcome)
    }

    /// Dismisses the open prompt.
    ///
    /// By default the next check-in is scheduled one interval out and no
    /// alert is raised; with `escalate_on_cancel` the dismissal escalates.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotPrompting`] when no prompt is open.
    pub async fn cancel_verification(&self) -> Result<()> {
        let inner = &self.inner;
        let mut guard = inner.state.lock().await;
        let state = &mut *guard;

        if !state.session.cancel() {
            return Err(CheckInError::NotPrompting.into());
        }
        state.cancel_countdown();
        inner.emit(&EngineEvent::VerificationCanceled);

        let now = inner.clock.now();
        if inner.config.escalate_on_cancel {
            log::warn!("Verification canceled; escalating");
            inner.handle_lapse(state, AlertReason::UserCanceled, now);
        } else {
            let next = state.scheduler.skip(now)?;
            inner.schedule_checkin(state, &next);
            log::info!("Verification canceled; next check due at {}", next.deadline);
            inner.emit(&EngineEvent::CycleScheduled {
                cycle_id: next.id,
                due_at: next.deadline,
            });
        }
        Ok(())
    }

    /// Raises an emergency alert straight away, armed or not.
    ///
    /// Uses the same throttle as a lapsed check-in, so a second press inside
    /// the minimum interval returns the alert already sent.
    pub async fn trigger_emergency(&self) -> AlertEvent {
        {
            let mut state = self.inner.state.lock().await;
            if let Some(tracking) = state.tracking.as_mut() {
                tracking.alerts_triggered += 1;
            }
        }
        log::warn!("Emergency raised by the user");
        self.inner
            .dispatcher
            .escalate(AlertReason::Manual, &self.inner.config.owner_id)
            .await
    }

    /// Sends a test alert so the user can check their contacts receive it.
    pub async fn send_test_alert(&self) -> AlertEvent {
        self.inner
            .dispatcher
            .send_test_alert(&self.inner.config.owner_id)
            .await
    }

    /// Adds a position fix to the location trail.
    pub async fn record_location(&self, sample: LocationSample) {
        self.inner.location.record(sample);
        let mut state = self.inner.state.lock().await;
        if let Some(tracking) = state.tracking.as_mut() {
            tracking.location_points += 1;
        }
    }

    /// Waits for every escalation handed off so far to finish dispatching.
    pub async fn wait_for_dispatches(&self) {
        let pending = std::mem::take(&mut self.inner.state.lock().await.dispatches);
        for task in pending {
            if let Err(e) = task.await {
                log::warn!("Alert dispatch task failed: {e}");
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn status(&self) -> EngineStatus {
        let state = self.inner.state.lock().await;
        let prompting = state.session.is_prompting();

        EngineStatus {
            scheduler_state: state.scheduler.state(),
            session_state: state.session.state(),
            credential_configured: state.credentials.is_configured(),
            interval_minutes: state.credentials.current_interval_minutes(),
            code_length: state.credentials.code_length(),
            current_cycle: state.scheduler.current().cloned(),
            next_due_at: state.scheduler.next_due_at(),
            verification_deadline: state.session.deadline(),
            attempts_remaining: prompting.then_some(state.session.attempts_remaining()),
            last_verified_at: state
                .scheduler
                .last_verified_at()
                .or_else(|| self.inner.load_last_verified()),
            cycles_confirmed: state.scheduler.cycles_confirmed(),
            cycles_missed: state.scheduler.cycles_missed(),
            tracking: state.tracking.clone(),
            latest_location: self.inner.location.latest(),
        }
    }

    /// Dispatched alerts, oldest first.
    pub async fn alert_history(&self) -> Vec<AlertEvent> {
        self.inner.dispatcher.history().await
    }

    /// Finished tracking sessions, oldest first.
    pub async fn tracking_history(&self) -> Vec<TrackingSession> {
        self.inner.state.lock().await.tracking_history.to_vec()
    }

    /// Recorded location trail, oldest first.
    #[must_use]
    pub fn location_trail(&self) -> Vec<LocationSample> {
        self.inner.location.samples()
    }
}

impl EngineState {
    fn cancel_countdown(&mut self) {
        self.countdown_timer = None;
        self.countdown_generation += 1;
    }
}

impl EngineInner {
    // ── Timers ───────────────────────────────────────────────────────

    fn schedule_checkin(self: &Arc<Self>, state: &mut EngineState, cycle: &CheckInCycle) {
        state.checkin_generation += 1;
        let generation = state.checkin_generation;
        let at = Instant::now() + delay_until(self.clock.now(), cycle.deadline);
        let engine = Arc::downgrade(self);

        log::debug!("Check-in {} timer set for {}", cycle.id, cycle.deadline);
        state.checkin_timer = Some(TimerHandle::spawn(at, async move {
            if let Some(inner) = engine.upgrade() {
                inner.on_checkin_due(generation).await;
            }
        }));
    }

    fn schedule_countdown(self: &Arc<Self>, state: &mut EngineState, deadline: DateTime<Utc>) {
        state.countdown_generation += 1;
        let generation = state.countdown_generation;
        let at = Instant::now() + delay_until(self.clock.now(), deadline);
        let engine = Arc::downgrade(self);

        log::debug!("Verification countdown set for {deadline}");
        state.countdown_timer = Some(TimerHandle::spawn(at, async move {
            if let Some(inner) = engine.upgrade() {
                inner.on_countdown_expired(generation).await;
            }
        }));
    }

    async fn on_checkin_due(self: &Arc<Self>, generation: u64) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.checkin_generation != generation || !state.scheduler.is_armed() {
            log::debug!("Ignoring stale check-in timer");
            return;
        }
        if let Some(timer) = state.checkin_timer.take() {
            timer.detach();
        }

        let cycle = match state.scheduler.begin_verification() {
            Ok(cycle) => cycle,
            Err(e) => {
                log::warn!("Cannot open verification: {e}");
                return;
            }
        };

        // The timer has fired, so the cycle is due even if the clock lags.
        let now = self.clock.now().max(cycle.deadline);
        let deadline = state.session.open(now);
        self.schedule_countdown(state, deadline);

        log::info!("Safety check {} opened; code due by {deadline}", cycle.id);
        self.emit(&EngineEvent::VerificationOpened {
            cycle_id: cycle.id,
            deadline,
            attempts_remaining: state.session.attempts_remaining(),
        });
    }

    async fn on_countdown_expired(self: &Arc<Self>, generation: u64) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.countdown_generation != generation {
            log::debug!("Ignoring stale countdown timer");
            return;
        }
        if let Some(timer) = state.countdown_timer.take() {
            timer.detach();
        }

        let Some(deadline) = state.session.deadline() else {
            return;
        };
        let now = self.clock.now().max(deadline);
        if state.session.expire(now) {
            log::warn!("Verification countdown expired without a code");
            self.handle_lapse(state, AlertReason::Timeout, now);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Marks the awaiting cycle missed, resumes the loop and hands the
    /// escalation to a dispatch task.
    fn handle_lapse(
        self: &Arc<Self>,
        state: &mut EngineState,
        reason: AlertReason,
        now: DateTime<Utc>,
    ) {
        match state.scheduler.miss(now) {
            Ok((missed, next)) => {
                log::warn!("Check-in {} missed: {}", missed.id, reason.message_text());
                self.schedule_checkin(state, &next);
                self.emit(&EngineEvent::CycleScheduled {
                    cycle_id: next.id,
                    due_at: next.deadline,
                });
            }
            Err(e) => log::warn!("Cannot record missed check-in: {e}"),
        }

        if let Some(tracking) = state.tracking.as_mut() {
            tracking.cycles_missed += 1;
            tracking.alerts_triggered += 1;
        }

        state.dispatches.retain(|task| !task.is_finished());
        let dispatcher = Arc::clone(&self.dispatcher);
        let owner_id = self.config.owner_id.clone();
        state.dispatches.push(tokio::spawn(async move {
            dispatcher.escalate(reason, &owner_id).await
        }));
    }

    fn emit(&self, event: &EngineEvent) {
        if let Some(sink) = &self.sink {
            sink.notify(event);
        }
    }

    fn load_last_verified(&self) -> Option<DateTime<Utc>> {
        load_json(self.persistence.as_ref(), KEY_LAST_VERIFIED).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable last verification time: {e}");
            None
        })
    }

    fn persist_last_verified(&self, at: DateTime<Utc>) {
        if let Err(e) = save_json(self.persistence.as_ref(), KEY_LAST_VERIFIED, &at) {
            log::warn!("Failed to persist last verification time: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::{SchedulerState, SessionState};
    use crate::contact::{MemoryContactDirectory, NewContact, Relation};
    use crate::escalation::LoggingTransport;
    use crate::storage::MemoryPersistence;
    use std::time::Duration;

    fn engine_with(persistence: Arc<MemoryPersistence>, with_contact: bool) -> SafetyEngine {
        let contacts = Arc::new(MemoryContactDirectory::load(persistence.clone()).unwrap());
        if with_contact {
            contacts
                .add(NewContact::new("Asha", "+91 98765 43210", Relation::Family))
                .unwrap();
        }
        SafetyEngine::new(
            EngineConfig::default(),
            Collaborators::new(persistence, contacts, Arc::new(LoggingTransport)),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn arm_requires_credential() {
        let engine = engine_with(Arc::new(MemoryPersistence::new()), true);
        let err = engine.arm().await.unwrap_err();
        assert!(matches!(err, EngineError::NoCredentialConfigured));
    }

    #[tokio::test(start_paused = true)]
    async fn arm_requires_contacts() {
        let engine = engine_with(Arc::new(MemoryPersistence::new()), false);
        engine.set_credential("4242", 5).await.unwrap();
        let err = engine.arm().await.unwrap_err();
        assert!(matches!(err, EngineError::NoContactsConfigured));
        assert_eq!(engine.status().await.scheduler_state, SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn credential_is_locked_while_armed() {
        let engine = engine_with(Arc::new(MemoryPersistence::new()), true);
        engine.set_credential("4242", 5).await.unwrap();
        engine.arm().await.unwrap();

        assert!(engine.set_credential("1111", 5).await.unwrap_err().is_already_armed());
        assert!(engine.arm().await.unwrap_err().is_already_armed());
        assert!(engine.clear_credential().await.unwrap_err().is_already_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_opens_when_interval_elapses() {
        let engine = engine_with(Arc::new(MemoryPersistence::new()), true);
        engine.set_credential("4242", 1).await.unwrap();
        engine.arm().await.unwrap();

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(engine.status().await.session_state, SessionState::Idle);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let status = engine.status().await;
        assert!(status.is_prompting());
        assert_eq!(status.attempts_remaining, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_without_prompt_is_rejected() {
        let engine = engine_with(Arc::new(MemoryPersistence::new()), true);
        engine.set_credential("4242", 5).await.unwrap();
        engine.arm().await.unwrap();

        let err = engine.submit_code("4242").await.unwrap_err();
        assert!(matches!(err, EngineError::CheckIn(CheckInError::NotPrompting)));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_records_tracking_session() {
        let persistence = Arc::new(MemoryPersistence::new());
        let engine = engine_with(persistence.clone(), true);
        engine.set_credential("4242", 5).await.unwrap();
        engine.arm().await.unwrap();

        let finished = engine.disarm().await.unwrap();

        assert!(!finished.is_active());
        assert_eq!(engine.tracking_history().await, vec![finished]);
        assert!(persistence.contains(KEY_TRACKING_SESSIONS));
        assert!(matches!(
            engine.disarm().await.unwrap_err(),
            EngineError::CheckIn(CheckInError::NotArmed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn credential_survives_restart() {
        let persistence = Arc::new(MemoryPersistence::new());
        engine_with(persistence.clone(), true)
            .set_credential("4242", 15)
            .await
            .unwrap();

        let restarted = engine_with(persistence, false);
        let status = restarted.status().await;
        assert!(status.credential_configured);
        assert_eq!(status.interval_minutes, Some(15));
        assert_eq!(status.code_length, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected() {
        let persistence = Arc::new(MemoryPersistence::new());
        let contacts = Arc::new(MemoryContactDirectory::load(persistence.clone()).unwrap());
        let config = EngineConfig {
            max_attempts: 0,
            ..EngineConfig::default()
        };

        let result = SafetyEngine::new(
            config,
            Collaborators::new(persistence, contacts, Arc::new(LoggingTransport)),
        );

        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
