//! Location data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geohash length used in alert messages (~19m x 38m cell).
pub const ALERT_GEOHASH_PRECISION: u8 = 8;

/// Why a position fix could not be obtained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// The user denied location access.
    #[error("Location access was denied")]
    PermissionDenied,

    /// The device could not produce a fix.
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the allowed time.
    #[error("Location request timed out")]
    Timeout,

    /// The fix had coordinates outside the valid ranges.
    #[error("Invalid coordinates: {lat}, {lng}")]
    InvalidCoordinates {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lng: f64,
    },
}

/// A single position fix.
///
/// Samples are immutable once captured; the trail only ever appends them.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use safeguard_core::location::LocationSample;
///
/// let sample = LocationSample::new(12.9716, 77.5946, 8.0, Utc::now()).unwrap();
/// assert_eq!(
///     sample.map_url(),
///     "https://www.google.com/maps?q=12.9716,77.5946"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    /// Latitude in degrees (-90.0 to 90.0).
    pub lat: f64,
    /// Longitude in degrees (-180.0 to 180.0).
    pub lng: f64,
    /// Reported horizontal accuracy in meters.
    pub accuracy_meters: f64,
    /// When the fix was taken (UTC).
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    /// Creates a validated sample.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidCoordinates`] for non-finite or
    /// out-of-range coordinates. A negative or non-finite accuracy is
    /// stored as 0.0 (unknown).
    pub fn new(
        lat: f64,
        lng: f64,
        accuracy_meters: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, LocationError> {
        // Latitude must be -90.0 to 90.0, Longitude must be -180.0 to 180.0
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if !lat_ok || !lng_ok {
            return Err(LocationError::InvalidCoordinates { lat, lng });
        }

        let accuracy_meters = if accuracy_meters.is_finite() && accuracy_meters >= 0.0 {
            accuracy_meters
        } else {
            0.0
        };

        Ok(Self {
            lat,
            lng,
            accuracy_meters,
            captured_at,
        })
    }

    /// Human-readable `lat, lng` pair.
    #[must_use]
    pub fn coordinates_text(&self) -> String {
        format!("{}, {}", self.lat, self.lng)
    }

    /// Map link for the sample.
    #[must_use]
    pub fn map_url(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lng)
    }

    /// Geohash of the sample at the given length.
    ///
    /// Returns an empty string if encoding fails, which only happens for
    /// coordinates the constructor already rejects.
    #[must_use]
    pub fn geohash(&self, precision: u8) -> String {
        geohash::encode(
            geohash::Coord {
                x: self.lng,
                y: self.lat,
            },
            usize::from(precision),
        )
        .unwrap_or_default()
    }
}
