//! Check-in cycles and code verification.
//!
//! # Architecture
//!
//! ```text
//! CheckInScheduler (when is the next check due?)
//!     └── CheckInCycle (Pending -> AwaitingVerification -> Confirmed | Missed)
//! VerificationSession (one prompt: countdown, comparison, attempt count)
//!     └── Idle -> Prompting -> Verified | TimedOut
//! ```
//!
//! Both machines are synchronous and take `now` explicitly. Timers and
//! escalation live in the engine, which drives these types.

mod error;
mod scheduler;
mod session;
pub mod types;

pub use error::{CheckInError, Result};
pub use scheduler::{CheckInScheduler, SchedulerState};
pub use session::{SessionState, SubmitOutcome, VerificationSession};
pub use types::{CheckInCycle, CycleStatus};
