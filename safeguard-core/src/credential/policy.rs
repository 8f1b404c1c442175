//! Code length policy and input validation.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::store::{MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};

/// Accepted security code lengths.
///
/// Deployments either accept a range of lengths or require one exact length;
/// both are expressed through this single policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CodeLengthPolicy {
    /// Any length in `min..=max`.
    Range {
        /// Shortest accepted code.
        min: usize,
        /// Longest accepted code.
        max: usize,
    },
    /// Exactly `length` digits.
    Exact {
        /// Required code length.
        length: usize,
    },
}

impl Default for CodeLengthPolicy {
    fn default() -> Self {
        Self::Range { min: 4, max: 8 }
    }
}

impl CodeLengthPolicy {
    /// Returns the inclusive `(min, max)` length bounds.
    #[must_use]
    pub const fn bounds(self) -> (usize, usize) {
        match self {
            Self::Range { min, max } => (min, max),
            Self::Exact { length } => (length, length),
        }
    }

    /// Returns whether a code of `len` digits is allowed.
    #[must_use]
    pub const fn accepts(self, len: usize) -> bool {
        let (min, max) = self.bounds();
        len >= min && len <= max
    }

    /// Returns whether the policy itself is usable.
    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        let (min, max) = self.bounds();
        min >= 1 && min <= max
    }
}

/// Validates a security code against `policy`.
///
/// # Errors
///
/// Returns [`ValidationError::CodeNotNumeric`] for empty or non-digit input
/// and [`ValidationError::CodeWrongLength`] when the length is not allowed.
pub fn validate_code(code: &str, policy: CodeLengthPolicy) -> Result<(), ValidationError> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::CodeNotNumeric);
    }

    if !policy.accepts(code.len()) {
        let (min, max) = policy.bounds();
        return Err(ValidationError::CodeWrongLength {
            min,
            max,
            actual: code.len(),
        });
    }

    Ok(())
}

/// Validates a check-in interval in minutes.
///
/// # Errors
///
/// Returns [`ValidationError::IntervalOutOfRange`] outside `1..=60`.
pub const fn validate_interval(interval_minutes: u32) -> Result<(), ValidationError> {
    if interval_minutes < MIN_INTERVAL_MINUTES || interval_minutes > MAX_INTERVAL_MINUTES {
        return Err(ValidationError::IntervalOutOfRange(interval_minutes));
    }
    Ok(())
}
