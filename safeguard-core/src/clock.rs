//! Wall-clock sources.
//!
//! Timers run on tokio's clock, while every recorded timestamp is a
//! `DateTime<Utc>`. [`TokioClock`] ties the two together so that a paused
//! tokio runtime (in tests) also freezes recorded timestamps.

use chrono::{DateTime, Duration, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock anchored to `tokio::time::Instant`.
///
/// The wall time is sampled once at construction; afterwards `now()` adds
/// the elapsed tokio time, so it follows `tokio::time::pause`/`advance`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base_wall: DateTime<Utc>,
    base_instant: tokio::time::Instant,
}

impl TokioClock {
    /// Creates a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_wall: Utc::now(),
            base_instant: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.base_instant.elapsed();
        self.base_wall + Duration::from_std(elapsed).unwrap_or_else(|_| Duration::zero())
    }
}

/// Converts a signed wall-clock span into a timer delay, clamping past
/// instants to zero.
#[must_use]
pub fn delay_until(now: DateTime<Utc>, at: DateTime<Utc>) -> std::time::Duration {
    (at - now).to_std().unwrap_or_default()
}

/// Manually driven clock for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }

    /// Sets the clock to an absolute time.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = to;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
