//! Recipient type.
//!
//! An identity that vault objects are encrypted to.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::TrustLevel;
use crate::core::types::{Fingerprint, RecipientName};

/// A recipient who can decrypt the vault.
///
/// Equality and hashing use the fingerprint only; the name is for display
/// and the trust level is resolved from the keyring at validation time and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    name: RecipientName,
    fingerprint: Fingerprint,
    #[serde(skip)]
    trust: Option<TrustLevel>,
}

impl Recipient {
    pub fn new(name: impl Into<RecipientName>, fingerprint: Fingerprint) -> Self {
        Self {
            name: name.into(),
            fingerprint,
            trust: None,
        }
    }

    /// Attach the trust level resolved from the keyring.
    pub fn with_trust(mut self, trust: TrustLevel) -> Self {
        self.trust = Some(trust);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Trust level, if this recipient went through validation.
    pub fn trust(&self) -> Option<TrustLevel> {
        self.trust
    }

    /// Whether `id` names this recipient, by fingerprint or exact name.
    pub fn answers_to(&self, id: &str) -> bool {
        match Fingerprint::parse(id) {
            Ok(fpr) => fpr == self.fingerprint,
            Err(_) => self.name == id,
        }
    }
}

impl PartialEq for Recipient {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Recipient {}

impl Hash for Recipient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.fingerprint.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPR: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

    #[test]
    fn test_equality_ignores_name_and_trust() {
        let a = Recipient::new("alice", Fingerprint::parse(FPR).unwrap());
        let b = Recipient::new("someone else", Fingerprint::parse(FPR).unwrap())
            .with_trust(TrustLevel::Full);
        assert_eq!(a, b);
    }

    #[test]
    fn test_answers_to_fingerprint_or_name() {
        let r = Recipient::new("bob@example.com", Fingerprint::parse(FPR).unwrap());
        assert!(r.answers_to("bob@example.com"));
        assert!(r.answers_to(&FPR.to_lowercase()));
        assert!(!r.answers_to("alice@example.com"));
    }

    #[test]
    fn test_trust_not_serialized() {
        let r = Recipient::new("bob", Fingerprint::parse(FPR).unwrap())
            .with_trust(TrustLevel::Ultimate);
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("ultimate"));
        assert!(json.contains(FPR));
    }
}
