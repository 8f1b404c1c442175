//! Credential store.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{CredentialError, Result};
use super::policy::{validate_code, validate_interval, CodeLengthPolicy};
use crate::storage::{load_json, save_json, Persistence, KEY_SECURITY_CREDENTIAL};

/// Shortest accepted check-in interval.
pub const MIN_INTERVAL_MINUTES: u32 = 1;
/// Longest accepted check-in interval.
pub const MAX_INTERVAL_MINUTES: u32 = 60;

const SALT_LEN: usize = 16;

/// The active credential, held only as a salted digest.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SecurityCredential {
    salt: [u8; SALT_LEN],
    digest: [u8; 32],
    #[zeroize(skip)]
    code_length: usize,
    #[zeroize(skip)]
    interval_minutes: u32,
}

impl std::fmt::Debug for SecurityCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityCredential")
            .field("digest", &"<redacted>")
            .field("interval_minutes", &self.interval_minutes)
            .finish_non_exhaustive()
    }
}

impl SecurityCredential {
    fn derive(code: &str, interval_minutes: u32) -> Self {
        let salt: [u8; SALT_LEN] = rand::random();
        Self {
            digest: digest_code(&salt, code),
            salt,
            code_length: code.len(),
            interval_minutes,
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        let candidate_digest = digest_code(&self.salt, candidate);
        candidate_digest[..].ct_eq(&self.digest[..]).into()
    }
}

fn digest_code(salt: &[u8], code: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(code.as_bytes());
    hasher.finalize().into()
}

/// Persisted form of the credential.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredential {
    salt: String,
    digest: String,
    code_length: usize,
    interval_minutes: u32,
}

impl From<&SecurityCredential> for StoredCredential {
    fn from(credential: &SecurityCredential) -> Self {
        Self {
            salt: hex::encode(credential.salt),
            digest: hex::encode(credential.digest),
            code_length: credential.code_length,
            interval_minutes: credential.interval_minutes,
        }
    }
}

impl TryFrom<StoredCredential> for SecurityCredential {
    type Error = CredentialError;

    fn try_from(stored: StoredCredential) -> Result<Self> {
        let salt: [u8; SALT_LEN] = hex::decode(&stored.salt)
            .map_err(|e| CredentialError::Corrupt(format!("salt: {e}")))?
            .try_into()
            .map_err(|_| CredentialError::Corrupt("salt has wrong length".to_string()))?;
        let digest: [u8; 32] = hex::decode(&stored.digest)
            .map_err(|e| CredentialError::Corrupt(format!("digest: {e}")))?
            .try_into()
            .map_err(|_| CredentialError::Corrupt("digest has wrong length".to_string()))?;
        validate_interval(stored.interval_minutes)?;

        Ok(Self {
            salt,
            digest,
            code_length: stored.code_length,
            interval_minutes: stored.interval_minutes,
        })
    }
}

/// Holds the active security code and check-in interval.
///
/// The store is the only component that ever sees a candidate code; it
/// answers with a plain yes/no from [`CredentialStore::compare`].
pub struct CredentialStore {
    policy: CodeLengthPolicy,
    credential: Option<SecurityCredential>,
    persistence: Arc<dyn Persistence>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("policy", &self.policy)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates an empty store using `policy` for code validation.
    #[must_use]
    pub fn new(policy: CodeLengthPolicy, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            policy,
            credential: None,
            persistence,
        }
    }

    /// Restores a previously persisted credential.
    ///
    /// Returns `true` if a credential was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the record is corrupt.
    pub fn load(&mut self) -> Result<bool> {
        let stored: Option<StoredCredential> =
            load_json(self.persistence.as_ref(), KEY_SECURITY_CREDENTIAL)?;
        match stored {
            Some(stored) => {
                self.credential = Some(SecurityCredential::try_from(stored)?);
                log::info!("Loaded saved security credential");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Validates and installs a new credential, then persists it.
    ///
    /// Surrounding whitespace in `code` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Validation`] for a bad code or interval,
    /// and [`CredentialError::Storage`] if persisting fails. On error the
    /// previous credential stays active.
    pub fn set_credential(&mut self, code: &str, interval_minutes: u32) -> Result<()> {
        let code = code.trim();
        validate_code(code, self.policy)?;
        validate_interval(interval_minutes)?;

        let credential = SecurityCredential::derive(code, interval_minutes);
        save_json(
            self.persistence.as_ref(),
            KEY_SECURITY_CREDENTIAL,
            &StoredCredential::from(&credential),
        )?;
        self.credential = Some(credential);

        log::info!("Security code set with check interval of {interval_minutes} minutes");
        Ok(())
    }

    /// Compares a candidate code with the active credential in constant time.
    ///
    /// Returns `false` when no credential is configured.
    #[must_use]
    pub fn compare(&self, candidate: &str) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| credential.matches(candidate.trim()))
    }

    /// Active check-in interval in minutes.
    #[must_use]
    pub fn current_interval_minutes(&self) -> Option<u32> {
        self.credential.as_ref().map(|c| c.interval_minutes)
    }

    /// Active check-in interval as a duration.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.current_interval_minutes()
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }

    /// Length of the active code, for prompts that render one box per digit.
    #[must_use]
    pub fn code_length(&self) -> Option<usize> {
        self.credential.as_ref().map(|c| c.code_length)
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    #[must_use]
    pub const fn policy(&self) -> CodeLengthPolicy {
        self.policy
    }

    /// Forgets the credential and removes it from persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        self.credential = None;
        self.persistence.remove(KEY_SECURITY_CREDENTIAL)?;
        Ok(())
    }
}
