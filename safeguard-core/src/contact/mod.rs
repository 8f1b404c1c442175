//! Emergency contacts.
//!
//! The engine only ever reads the contact list, at arm time (at least one
//! contact is required) and at escalation time (the alert recipients).
//! Editing contacts is the host's business; [`MemoryContactDirectory`] is a
//! small validated implementation for hosts that do not bring their own.
//!
//! # Types
//!
//! - [`EmergencyContact`]: one recipient; the first in the list is primary
//! - [`Relation`]: how the contact relates to the traveller
//! - [`ContactDirectory`]: read seam used by the engine

mod directory;
mod error;
pub mod types;

pub use directory::{ContactDirectory, MemoryContactDirectory};
pub use error::{ContactError, Result};
pub use types::{validate_phone, EmergencyContact, NewContact, Relation};
