//! Keyring records.
//!
//! Typed view of the backend's key listing, decoded once at the adapter
//! boundary so nothing else parses backend text.

use serde::Serialize;
use std::fmt;

use crate::core::types::{Fingerprint, RecipientName};

/// Keyring validity/trust label for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Unknown,
    Expired,
    Revoked,
    Invalid,
    Disabled,
    Never,
    Marginal,
    Full,
    Ultimate,
}

impl TrustLevel {
    /// Decode a gpg colon-listing validity code (field 2).
    pub fn from_code(code: &str) -> Self {
        match code {
            "u" => Self::Ultimate,
            "f" => Self::Full,
            "m" => Self::Marginal,
            "n" => Self::Never,
            "e" => Self::Expired,
            "r" => Self::Revoked,
            "i" => Self::Invalid,
            "d" => Self::Disabled,
            _ => Self::Unknown,
        }
    }

    /// Only full and ultimate trust may be used as encryption targets.
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::Full | Self::Ultimate)
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Invalid => "invalid",
            Self::Disabled => "disabled",
            Self::Never => "never",
            Self::Marginal => "marginal",
            Self::Full => "full",
            Self::Ultimate => "ultimate",
        };
        f.write_str(s)
    }
}

/// One primary key in the keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub fingerprint: Fingerprint,
    pub trust: TrustLevel,
    /// First user id on the key, if any.
    pub uid: Option<RecipientName>,
}

impl KeyRecord {
    /// Whether this record answers to `key_id`.
    ///
    /// A fingerprint or long key id matches as a fingerprint suffix. An
    /// email address matches the uid's `<addr>` (or a bare-address uid)
    /// exactly, ignoring case. Anything else must equal the whole uid.
    pub fn matches(&self, key_id: &str) -> bool {
        if let Ok(fpr) = Fingerprint::parse(key_id) {
            return self.fingerprint.as_str().ends_with(fpr.as_str());
        }
        let Some(uid) = self.uid.as_deref() else {
            return false;
        };
        let wanted = key_id.trim_start_matches('<').trim_end_matches('>');
        if wanted.contains('@') {
            return address(uid).is_some_and(|addr| addr.eq_ignore_ascii_case(wanted));
        }
        uid == key_id
    }
}

/// The email address in a uid: the `<...>` part, or the whole uid when it
/// is a bare address.
fn address(uid: &str) -> Option<&str> {
    match (uid.rfind('<'), uid.rfind('>')) {
        (Some(open), Some(close)) if open < close => Some(&uid[open + 1..close]),
        _ if uid.contains('@') && !uid.contains(char::is_whitespace) => Some(uid),
        _ => None,
    }
}
