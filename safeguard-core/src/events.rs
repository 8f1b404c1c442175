//! Engine notifications for the UI.
//!
//! The engine reports every user-visible transition as an [`EngineEvent`]
//! through an optional [`UiSink`]. Events serialize with a `type` tag so a
//! host can forward them as JSON unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::escalation::AlertEvent;

/// Observable engine transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// Check-ins started.
    #[serde(rename_all = "camelCase")]
    Armed { next_due_at: DateTime<Utc> },

    /// Check-ins stopped.
    Disarmed,

    /// A new cycle is waiting for its due time.
    #[serde(rename_all = "camelCase")]
    CycleScheduled { cycle_id: u64, due_at: DateTime<Utc> },

    /// The code prompt is open.
    #[serde(rename_all = "camelCase")]
    VerificationOpened {
        cycle_id: u64,
        deadline: DateTime<Utc>,
        attempts_remaining: u32,
    },

    /// A wrong code was entered; the prompt stays open.
    #[serde(rename_all = "camelCase")]
    VerificationFailed { attempts_remaining: u32 },

    /// The correct code was entered.
    #[serde(rename_all = "camelCase")]
    VerificationSucceeded { verified_at: DateTime<Utc> },

    /// The prompt was dismissed or discarded.
    VerificationCanceled,

    /// An alert was dispatched.
    Escalated { alert: AlertEvent },
}

/// Receives engine events.
///
/// Called from inside engine operations and timer tasks. Implementations
/// must return quickly and must not call back into the engine.
pub trait UiSink: Send + Sync {
    fn notify(&self, event: &EngineEvent);
}

/// Sink that forwards events to an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver it feeds.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UiSink for ChannelSink {
    fn notify(&self, event: &EngineEvent) {
        if self.tx.send(event.clone()).is_err() {
            log::debug!("Event receiver dropped; discarding {event:?}");
        }
    }
}
