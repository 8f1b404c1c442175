//! Engine configuration.
//!
//! Every limit the engine enforces is a field here so deployments that want
//! a different attempt count, countdown or code length do not need a
//! separate code path. Missing JSON fields take their defaults.

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::CodeLengthPolicy;
use crate::escalation::DispatcherSettings;

/// Error type for configuration parsing and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// The JSON document could not be parsed.
    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tunables for a [`SafetyEngine`](crate::SafetyEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Wrong codes allowed per prompt before escalating.
    pub max_attempts: u32,

    /// Seconds the user has to enter the code once prompted.
    pub verification_countdown_secs: u64,

    /// Minimum seconds between two dispatched alerts.
    pub min_notification_interval_secs: u64,

    /// Alert history length.
    pub alert_history_cap: usize,

    /// Finished tracking session history length.
    pub tracking_history_cap: usize,

    /// Location trail length.
    pub location_trail_cap: usize,

    /// Milliseconds to wait for a fresh fix when building an alert.
    pub location_grace_ms: u64,

    /// Accepted security code lengths.
    pub code_policy: CodeLengthPolicy,

    /// Whether dismissing the prompt raises an alert.
    ///
    /// When false (default) a dismissal closes the prompt and schedules the
    /// next check-in.
    pub escalate_on_cancel: bool,

    /// Identifier placed on alerts.
    pub owner_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            verification_countdown_secs: 30,
            min_notification_interval_secs: 60,
            alert_history_cap: 50,
            tracking_history_cap: 10,
            location_trail_cap: 100,
            location_grace_ms: 10_000,
            code_policy: CodeLengthPolicy::default(),
            escalate_on_cancel: false,
            owner_id: "unknown".to_string(),
        }
    }
}

// Upper bounds keep every span representable as a chrono duration.
const MAX_COUNTDOWN_SECS: u64 = 3600;
const MAX_NOTIFICATION_INTERVAL_SECS: u64 = 86_400;
const MAX_LOCATION_GRACE_MS: u64 = 60_000;

impl EngineConfig {
    /// Parses a JSON document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("maxAttempts must be at least 1".into()));
        }
        if !(1..=MAX_COUNTDOWN_SECS).contains(&self.verification_countdown_secs) {
            return Err(ConfigError::Invalid(format!(
                "verificationCountdownSecs must be 1-{MAX_COUNTDOWN_SECS}"
            )));
        }
        if self.min_notification_interval_secs > MAX_NOTIFICATION_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "minNotificationIntervalSecs must be at most {MAX_NOTIFICATION_INTERVAL_SECS}"
            )));
        }
        if self.location_grace_ms > MAX_LOCATION_GRACE_MS {
            return Err(ConfigError::Invalid(format!(
                "locationGraceMs must be at most {MAX_LOCATION_GRACE_MS}"
            )));
        }
        if self.alert_history_cap == 0
            || self.tracking_history_cap == 0
            || self.location_trail_cap == 0
        {
            return Err(ConfigError::Invalid("history caps must be at least 1".into()));
        }
        if !self.code_policy.is_well_formed() {
            return Err(ConfigError::Invalid(format!(
                "codePolicy is not usable: {:?}",
                self.code_policy
            )));
        }
        if self.owner_id.trim().is_empty() {
            return Err(ConfigError::Invalid("ownerId is required".into()));
        }
        Ok(())
    }

    /// Verification countdown as a chrono span.
    #[must_use]
    pub fn countdown(&self) -> Duration {
        secs(self.verification_countdown_secs.min(MAX_COUNTDOWN_SECS))
    }

    /// Minimum alert spacing as a chrono span.
    #[must_use]
    pub fn min_notification_interval(&self) -> Duration {
        secs(
            self.min_notification_interval_secs
                .min(MAX_NOTIFICATION_INTERVAL_SECS),
        )
    }

    #[must_use]
    pub const fn location_grace(&self) -> StdDuration {
        StdDuration::from_millis(self.location_grace_ms)
    }

    /// Settings for the escalation dispatcher.
    #[must_use]
    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            min_interval: self.min_notification_interval(),
            location_grace: self.location_grace(),
            history_cap: self.alert_history_cap,
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
fn secs(value: u64) -> Duration {
    // Callers clamp `value` far below i64::MAX.
    Duration::seconds(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.countdown(), Duration::seconds(30));
        assert_eq!(config.min_notification_interval(), Duration::seconds(60));
        assert_eq!(config.location_grace(), StdDuration::from_secs(10));
        assert_eq!(config.alert_history_cap, 50);
        assert_eq!(config.tracking_history_cap, 10);
        assert!(!config.escalate_on_cancel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EngineConfig::from_json(
            r#"{"maxAttempts":5,"codePolicy":{"kind":"exact","length":6}}"#,
        )
        .unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.code_policy, CodeLengthPolicy::Exact { length: 6 });
        assert_eq!(config.verification_countdown_secs, 30);
        assert_eq!(config.owner_id, "unknown");
    }

    #[test]
    fn json_roundtrip() {
        let config = EngineConfig {
            escalate_on_cancel: true,
            owner_id: "traveller-1".to_string(),
            ..EngineConfig::default()
        };
        let parsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_zero_attempts() {
        let err = EngineConfig::from_json(r#"{"maxAttempts":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_code_range() {
        let config = EngineConfig {
            code_policy: CodeLengthPolicy::Range { min: 8, max: 4 },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Config parse error: "));
    }
}
