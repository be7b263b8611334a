//! Type aliases and small newtypes for domain concepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{KeyringError, Result};

/// A recipient display name (usually the key's user id, e.g. an email).
pub type RecipientName = String;

/// A normalized OpenPGP key fingerprint (or long key id).
///
/// Whitespace is stripped and hex digits upper-cased, so
/// `"abcd 1234 ..."` and `"ABCD1234..."` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse and normalize a fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::InvalidFingerprint` unless the input is
    /// 16 to 64 hex digits after removing whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let valid = (16..=64).contains(&normalized.len())
            && normalized.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(KeyringError::InvalidFingerprint(raw.to_string()).into());
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last 16 hex digits, the conventional long key id.
    pub fn short(&self) -> &str {
        let start = self.0.len().saturating_sub(16);
        &self.0[start..]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = crate::error::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}
