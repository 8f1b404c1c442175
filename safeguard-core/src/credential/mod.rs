//! Security credential management.
//!
//! The credential is the secret numeric code a traveller re-enters to prove
//! they are safe, together with the check-in interval.
//!
//! # Secrecy
//!
//! - The cleartext code is never stored: only a salted SHA-256 digest is kept
//! - Digest comparison is constant time
//! - Salt and digest are wiped from memory on drop
//! - `Debug` output is redacted and the code is never logged

mod error;
mod policy;
mod store;

pub use error::{CredentialError, Result, ValidationError};
pub use policy::{validate_code, validate_interval, CodeLengthPolicy};
pub use store::{CredentialStore, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};
