//! Location module for Safeguard.
//!
//! Keeps the traveller's recent positions so an emergency alert can carry
//! the last known location:
//! - Validated position samples (coordinates range-checked on capture)
//! - A bounded, append-only trail (oldest entries dropped past the cap)
//! - A provider seam for the platform geolocation API
//! - A bounded grace period for fresh fixes at escalation time
//!
//! # Example Usage
//!
//! ```
//! use chrono::Utc;
//! use safeguard_core::location::LocationSample;
//!
//! let sample = LocationSample::new(12.9716, 77.5946, 12.0, Utc::now()).unwrap();
//! assert_eq!(sample.coordinates_text(), "12.9716, 77.5946");
//!
//! // Out-of-range coordinates are rejected
//! assert!(LocationSample::new(123.0, 0.0, 5.0, Utc::now()).is_err());
//! ```

mod provider;
mod trail;
pub mod types;

pub use provider::{LocationProvider, NoLocationProvider};
pub use trail::{LocationTracker, LocationTrail};
pub use types::{LocationError, LocationSample, ALERT_GEOHASH_PRECISION};
