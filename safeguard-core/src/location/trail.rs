//! Bounded location trail and the snapshot taken at escalation time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::provider::LocationProvider;
use super::types::LocationSample;
use crate::history::BoundedHistory;
use crate::storage::{load_json, save_json, Persistence, KEY_LOCATION_TRAIL};

/// Append-only trail of recent position fixes.
pub type LocationTrail = BoundedHistory<LocationSample>;

/// Keeps the location trail and answers "where is the user now?".
///
/// The trail is fed by the host's position watcher through
/// [`LocationTracker::record`]. At escalation time
/// [`LocationTracker::snapshot`] asks the provider for a fresh fix, bounded
/// by a grace period, and falls back to the newest trail entry.
pub struct LocationTracker {
    provider: Option<Arc<dyn LocationProvider>>,
    trail: Mutex<LocationTrail>,
    persistence: Arc<dyn Persistence>,
}

impl std::fmt::Debug for LocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationTracker")
            .field("has_provider", &self.provider.is_some())
            .field("trail_len", &self.len())
            .finish_non_exhaustive()
    }
}

impl LocationTracker {
    /// Creates a tracker, restoring any persisted trail.
    ///
    /// A corrupt persisted trail is discarded with a warning.
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn LocationProvider>>,
        persistence: Arc<dyn Persistence>,
        capacity: usize,
    ) -> Self {
        let restored: Vec<LocationSample> =
            match load_json(persistence.as_ref(), KEY_LOCATION_TRAIL) {
                Ok(samples) => samples.unwrap_or_default(),
                Err(e) => {
                    log::warn!("Discarding unreadable location trail: {e}");
                    Vec::new()
                }
            };

        Self {
            provider,
            trail: Mutex::new(LocationTrail::from_entries(restored, capacity)),
            persistence,
        }
    }

    /// Appends a sample to the trail and persists it.
    pub fn record(&self, sample: LocationSample) {
        let Ok(mut trail) = self.trail.lock() else {
            log::warn!("Location trail lock poisoned; dropping sample");
            return;
        };
        trail.push(sample);
        if let Err(e) = save_json(self.persistence.as_ref(), KEY_LOCATION_TRAIL, &*trail) {
            log::warn!("Failed to persist location trail: {e}");
        }
    }

    /// Newest recorded sample.
    #[must_use]
    pub fn latest(&self) -> Option<LocationSample> {
        self.trail.lock().ok().and_then(|trail| trail.latest().copied())
    }

    /// Copy of the trail, oldest first.
    #[must_use]
    pub fn samples(&self) -> Vec<LocationSample> {
        self.trail
            .lock()
            .map(|trail| trail.to_vec())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trail.lock().map(|trail| trail.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best available position for an alert.
    ///
    /// Tries the provider for at most `grace`; a fresh fix is recorded in the
    /// trail. On error or timeout the newest trail entry is used. Returns
    /// `None` if neither is available.
    pub async fn snapshot(&self, grace: Duration) -> Option<LocationSample> {
        if let Some(provider) = &self.provider {
            match tokio::time::timeout(grace, provider.current_location(grace)).await {
                Ok(Ok(sample)) => {
                    self.record(sample);
                    return Some(sample);
                }
                Ok(Err(e)) => log::warn!("Error getting position for emergency: {e}"),
                Err(_) => log::warn!("Location fetch exceeded {}ms grace period", grace.as_millis()),
            }
        }
        self.latest()
    }
}
