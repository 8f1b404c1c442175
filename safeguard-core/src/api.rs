//! Command facade for host applications.
//!
//! Hosts that cannot hold Rust types (a webview, a platform bridge) drive the
//! engine with JSON commands and get JSON responses back:
//!
//! ```text
//! {"command":"setCredential","code":"4242","intervalMinutes":5}
//!     -> {"type":"ok"}
//! {"command":"submitCode","code":"0000"}
//!     -> {"type":"submitted","outcome":{"outcome":"rejected","attemptsRemaining":2}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::checkin::{CheckInCycle, CheckInError, SubmitOutcome};
use crate::engine::{EngineError, EngineStatus, SafetyEngine, TrackingSession};
use crate::escalation::AlertEvent;
use crate::location::LocationSample;

/// Request accepted by [`SafeguardCore::handle`].
#[derive(Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    SetCredential { code: String, interval_minutes: u32 },
    ClearCredential,
    Arm,
    Disarm,
    SubmitCode { code: String },
    CancelVerification,
    #[serde(rename_all = "camelCase")]
    RecordLocation {
        lat: f64,
        lng: f64,
        #[serde(default)]
        accuracy_meters: f64,
        /// Defaults to the engine's current time.
        #[serde(default)]
        captured_at: Option<DateTime<Utc>>,
    },
    TriggerEmergency,
    SendTestAlert,
    GetStatus,
    AlertHistory,
    TrackingHistory,
}

// Codes never reach logs through `{:?}`.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetCredential {
                interval_minutes, ..
            } => f
                .debug_struct("SetCredential")
                .field("code", &"[REDACTED]")
                .field("interval_minutes", interval_minutes)
                .finish(),
            Self::SubmitCode { .. } => f
                .debug_struct("SubmitCode")
                .field("code", &"[REDACTED]")
                .finish(),
            Self::ClearCredential => f.write_str("ClearCredential"),
            Self::Arm => f.write_str("Arm"),
            Self::Disarm => f.write_str("Disarm"),
            Self::CancelVerification => f.write_str("CancelVerification"),
            Self::RecordLocation { lat, lng, .. } => f
                .debug_struct("RecordLocation")
                .field("lat", lat)
                .field("lng", lng)
                .finish_non_exhaustive(),
            Self::TriggerEmergency => f.write_str("TriggerEmergency"),
            Self::SendTestAlert => f.write_str("SendTestAlert"),
            Self::GetStatus => f.write_str("GetStatus"),
            Self::AlertHistory => f.write_str("AlertHistory"),
            Self::TrackingHistory => f.write_str("TrackingHistory"),
        }
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        if let Self::SetCredential { code, .. } | Self::SubmitCode { code } = self {
            code.zeroize();
        }
    }
}

/// Reply produced by [`SafeguardCore::handle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Ok,
    Armed {
        cycle: CheckInCycle,
    },
    Disarmed {
        session: TrackingSession,
    },
    Submitted {
        outcome: SubmitOutcome,
    },
    LocationRecorded {
        sample: LocationSample,
    },
    Alert {
        alert: AlertEvent,
    },
    Status {
        status: Box<EngineStatus>,
    },
    Alerts {
        alerts: Vec<AlertEvent>,
    },
    TrackingSessions {
        sessions: Vec<TrackingSession>,
    },
    Error {
        /// Stable machine-readable error name.
        kind: String,
        message: String,
    },
}

impl Response {
    fn error(kind: &str, message: impl Into<String>) -> Self {
        Self::Error {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    fn from_engine_error(err: &EngineError) -> Self {
        let kind = match err {
            EngineError::CheckIn(CheckInError::AlreadyArmed) => "alreadyArmed",
            EngineError::CheckIn(CheckInError::NotArmed) => "notArmed",
            EngineError::CheckIn(CheckInError::NotPrompting) => "notPrompting",
            EngineError::CheckIn(_) => "checkIn",
            EngineError::NoContactsConfigured => "noContactsConfigured",
            EngineError::NoCredentialConfigured => "noCredentialConfigured",
            EngineError::Credential(_) => "credential",
            EngineError::Config(_) => "config",
        };
        Self::error(kind, err.to_string())
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// JSON-friendly entry point wrapping a [`SafetyEngine`].
#[derive(Debug, Clone)]
pub struct SafeguardCore {
    engine: SafetyEngine,
}

impl SafeguardCore {
    #[must_use]
    pub const fn new(engine: SafetyEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub const fn engine(&self) -> &SafetyEngine {
        &self.engine
    }

    /// Runs one command against the engine.
    pub async fn handle(&self, command: Command) -> Response {
        log::debug!("Handling {command:?}");
        let engine = &self.engine;

        let result = match &command {
            Command::SetCredential {
                code,
                interval_minutes,
            } => engine
                .set_credential(code, *interval_minutes)
                .await
                .map(|()| Response::Ok),
            Command::ClearCredential => engine.clear_credential().await.map(|()| Response::Ok),
            Command::Arm => engine.arm().await.map(|cycle| Response::Armed { cycle }),
            Command::Disarm => engine
                .disarm()
                .await
                .map(|session| Response::Disarmed { session }),
            Command::SubmitCode { code } => engine
                .submit_code(code)
                .await
                .map(|outcome| Response::Submitted { outcome }),
            Command::CancelVerification => {
                engine.cancel_verification().await.map(|()| Response::Ok)
            }
            Command::RecordLocation {
                lat,
                lng,
                accuracy_meters,
                captured_at,
            } => {
                let captured_at = captured_at.unwrap_or_else(|| engine.now());
                return match LocationSample::new(*lat, *lng, *accuracy_meters, captured_at) {
                    Ok(sample) => {
                        engine.record_location(sample).await;
                        Response::LocationRecorded { sample }
                    }
                    Err(e) => Response::error("invalidLocation", e.to_string()),
                };
            }
            Command::TriggerEmergency => Ok(Response::Alert {
                alert: engine.trigger_emergency().await,
            }),
            Command::SendTestAlert => Ok(Response::Alert {
                alert: engine.send_test_alert().await,
            }),
            Command::GetStatus => Ok(Response::Status {
                status: Box::new(engine.status().await),
            }),
            Command::AlertHistory => Ok(Response::Alerts {
                alerts: engine.alert_history().await,
            }),
            Command::TrackingHistory => Ok(Response::TrackingSessions {
                sessions: engine.tracking_history().await,
            }),
        };

        result.unwrap_or_else(|e| {
            log::warn!("Command failed: {e}");
            Response::from_engine_error(&e)
        })
    }

    /// Parses a JSON command, runs it and serializes the reply.
    ///
    /// Malformed requests produce an `invalidRequest` error reply.
    pub async fn handle_json(&self, request: &str) -> String {
        let response = match serde_json::from_str::<Command>(request) {
            Ok(command) => self.handle(command).await,
            Err(e) => Response::error("invalidRequest", e.to_string()),
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            log::warn!("Failed to serialize response: {e}");
            r#"{"type":"error","kind":"internal","message":"response serialization failed"}"#
                .to_string()
        })
    }
}
