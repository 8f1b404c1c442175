//! Contact data types.

use serde::{Deserialize, Serialize};

use super::error::{ContactError, Result};

/// Minimum number of characters in a phone number.
pub const MIN_PHONE_LEN: usize = 10;

/// How a contact relates to the traveller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Family,
    Friend,
    Colleague,
    #[default]
    Other,
}

impl Relation {
    /// Converts to string representation for storage and messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Friend => "friend",
            Self::Colleague => "colleague",
            Self::Other => "other",
        }
    }

    /// Parses from string representation, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "family" => Some(Self::Family),
            "friend" => Some(Self::Friend),
            "colleague" => Some(Self::Colleague),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// An alert recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Stable identifier within the directory.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Phone number (digits, `+` and spaces).
    pub phone: String,
    /// Relationship to the traveller.
    pub relation: Relation,
    /// Whether this is the primary contact (first in the list).
    pub is_primary: bool,
}

/// Input for adding a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub relation: Relation,
}

impl NewContact {
    /// Creates contact input.
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>, relation: Relation) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            relation,
        }
    }

    /// Trims and validates the input.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::EmptyName`] or [`ContactError::InvalidPhone`].
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ContactError::EmptyName);
        }
        let phone = self.phone.trim().to_string();
        validate_phone(&phone)?;
        Ok(Self {
            name,
            phone,
            relation: self.relation,
        })
    }
}

/// Validates a phone number: `+`, digits and spaces only, at least
/// [`MIN_PHONE_LEN`] characters, and at least one digit.
///
/// # Errors
///
/// Returns [`ContactError::InvalidPhone`] otherwise.
pub fn validate_phone(phone: &str) -> Result<()> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ');
    let has_digit = phone.chars().any(|c| c.is_ascii_digit());
    if !allowed || !has_digit || phone.chars().count() < MIN_PHONE_LEN {
        return Err(ContactError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}
