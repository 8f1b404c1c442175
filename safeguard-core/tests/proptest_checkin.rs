//! Property-based tests for check-in invariants.
//!
//! These tests verify:
//! - A prompt never records more wrong attempts than allowed
//! - Bounded histories keep only the newest entries
//! - The first check after arming never extends the safety window
//! - Disarming at any point never raises an alert

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use safeguard_core::checkin::{CheckInScheduler, VerificationSession};
use safeguard_core::credential::CredentialStore;
use safeguard_core::history::BoundedHistory;
use safeguard_core::{CodeLengthPolicy, EngineConfig, MemoryPersistence, SessionState, SubmitOutcome};

fn credentials() -> CredentialStore {
    let mut store = CredentialStore::new(
        CodeLengthPolicy::default(),
        Arc::new(MemoryPersistence::new()),
    );
    store.set_credential(helpers::CODE, 5).unwrap();
    store
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever is typed, attempts stay within the limit and reaching the
    /// limit always ends the prompt.
    #[test]
    fn attempts_never_exceed_limit(
        max_attempts in 1u32..6,
        guesses in prop::collection::vec(prop::bool::ANY, 0..12),
    ) {
        let store = credentials();
        let now = Utc::now();
        let mut session = VerificationSession::new(max_attempts, chrono::Duration::seconds(30));
        session.open(now);

        for correct in guesses {
            let code = if correct { helpers::CODE } else { helpers::WRONG_CODE };
            let Ok(outcome) = session.submit(code, &store, now) else {
                prop_assert!(!session.is_prompting());
                break;
            };
            prop_assert!(session.attempts_made() <= max_attempts);
            if outcome == SubmitOutcome::Exhausted {
                prop_assert_eq!(session.state(), SessionState::TimedOut);
                prop_assert_eq!(session.attempts_made(), max_attempts);
            }
        }
    }

    #[test]
    fn history_keeps_newest_entries(
        capacity in 1usize..60,
        count in 0usize..200,
    ) {
        let mut history = BoundedHistory::new(capacity);
        for i in 0..count {
            history.push(i);
        }

        prop_assert_eq!(history.len(), count.min(capacity));
        if count > 0 {
            prop_assert_eq!(history.latest(), Some(&(count - 1)));
            let oldest = count.saturating_sub(capacity);
            prop_assert_eq!(history.iter().next(), Some(&oldest));
        }
    }

    /// The first check is never later than one interval after the last
    /// verification and never before now.
    #[test]
    fn first_check_never_extends_window(
        interval_minutes in 1i64..=60,
        verified_minutes_ago in prop::option::of(-5i64..240),
    ) {
        let now = Utc::now();
        let interval = chrono::Duration::minutes(interval_minutes);
        let last = verified_minutes_ago.map(|m| now - chrono::Duration::minutes(m));

        let mut scheduler = CheckInScheduler::new();
        let cycle = scheduler.arm(interval, now, last).unwrap();

        prop_assert!(cycle.deadline >= now);
        prop_assert!(cycle.deadline <= now + interval);
        if let Some(last) = last.filter(|last| *last <= now) {
            prop_assert!(cycle.deadline <= last + interval || cycle.deadline == now);
        }
    }

    /// Disarming at any moment, including while the prompt is open, never
    /// produces an alert.
    #[test]
    fn disarm_never_alerts(disarm_after_secs in 0u64..90) {
        let runtime = paused_runtime();
        let (alerts, sends) = runtime.block_on(async {
            let h = helpers::harness(EngineConfig::default());
            helpers::arm(&h, 1).await;

            helpers::advance(Duration::from_secs(disarm_after_secs)).await;
            h.engine.disarm().await.unwrap();
            helpers::advance(Duration::from_secs(3600)).await;
            h.engine.wait_for_dispatches().await;

            (h.engine.alert_history().await.len(), h.transport.send_count())
        });

        prop_assert_eq!(alerts, 0);
        prop_assert_eq!(sends, 0);
    }
}
