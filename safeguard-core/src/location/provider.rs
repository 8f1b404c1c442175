//! Position source seam.

use std::time::Duration;

use futures::future::BoxFuture;

use super::types::{LocationError, LocationSample};

/// Supplies the device's current position on demand.
///
/// Implementations wrap the platform geolocation API. `timeout` is the
/// longest the caller is willing to wait; the engine additionally bounds
/// the call on its side, so a provider that ignores it cannot stall an
/// escalation.
pub trait LocationProvider: Send + Sync {
    /// Requests a fresh position fix.
    fn current_location(&self, timeout: Duration)
        -> BoxFuture<'_, Result<LocationSample, LocationError>>;
}

/// Provider for hosts without positioning. Always reports unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocationProvider;

impl LocationProvider for NoLocationProvider {
    fn current_location(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'_, Result<LocationSample, LocationError>> {
        Box::pin(async {
            Err(LocationError::Unavailable(
                "Geolocation not supported".to_string(),
            ))
        })
    }
}
