//! Safeguard Core Library
//!
//! Check-in verification and emergency escalation for people travelling
//! alone. The traveller sets a numeric security code and a check-in
//! interval; every interval the engine asks for the code, and when the
//! countdown runs out or the attempts are used up it sends an alert with the
//! last known location to the emergency contacts.
//!
//! # Modules
//!
//! - [`credential`]: code and interval validation, salted digest storage
//! - [`checkin`]: scheduler and verification session state machines
//! - [`escalation`]: throttled alert dispatch and alert history
//! - [`engine`]: [`SafetyEngine`], which owns the state and the timers
//! - [`contact`], [`location`], [`storage`]: collaborator seams and the
//!   bundled implementations
//! - [`SafeguardCore`]: JSON command facade for host applications

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod contact;
pub mod credential;
pub mod engine;
pub mod escalation;
pub mod events;
pub mod history;
pub mod location;
pub mod storage;

pub use api::{Command, Response, SafeguardCore};
pub use checkin::{CheckInCycle, CycleStatus, SchedulerState, SessionState, SubmitOutcome};
pub use clock::{Clock, TokioClock};
pub use config::{ConfigError, EngineConfig};
pub use contact::{ContactDirectory, EmergencyContact, MemoryContactDirectory, NewContact, Relation};
pub use credential::{CodeLengthPolicy, CredentialError, ValidationError};
pub use engine::{Collaborators, EngineError, EngineStatus, SafetyEngine, TrackingSession};
pub use escalation::{
    AlertEvent, AlertReason, DispatchReceipt, DispatchStatus, LoggingTransport,
    NotificationTransport, TransportError,
};
pub use events::{ChannelSink, EngineEvent, UiSink};
pub use location::{LocationError, LocationProvider, LocationSample};
pub use storage::{MemoryPersistence, Persistence, SqlitePersistence, StorageError};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
