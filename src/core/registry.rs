//! Recipient registry.
//!
//! Decides whether a key may be used as an encryption target: it must be in
//! the backend keyring (importing it first when possible) and carry full or
//! ultimate trust.

use tracing::{debug, info};

use crate::core::cipher::Backend;
use crate::core::domain::{KeyRecord, Recipient};
use crate::core::types::Fingerprint;
use crate::error::{Error, KeyringError, Result};

/// Keyring-backed recipient validation.
pub struct Registry<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Registry<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Resolve `key_id` (fingerprint, long key id or email) to a trusted
    /// recipient.
    ///
    /// `name` overrides the display name; it defaults to the key's user id.
    ///
    /// # Errors
    ///
    /// - `KeyringError::KeyResolutionFailure` if the key cannot be found,
    ///   matches more than one keyring entry, or the backend fails while
    ///   importing or listing.
    /// - `KeyringError::UntrustedKey` if the key's trust is below full.
    pub fn validate(&self, key_id: &str, name: Option<&str>) -> Result<Recipient> {
        let key_id = key_id.trim();
        debug!(key = %key_id, "validating recipient");

        let record = match self.find(key_id)? {
            Some(record) => record,
            None => {
                let fingerprint = Fingerprint::parse(key_id).map_err(|_| {
                    resolution(key_id, "not in keyring (import needs a fingerprint)")
                })?;
                info!(fingerprint = %fingerprint, "importing key");
                self.backend
                    .import_keys(&[Recipient::new(key_id, fingerprint)])
                    .map_err(|e| resolution(key_id, &e.to_string()))?;
                self.find(key_id)?
                    .ok_or_else(|| resolution(key_id, "not in keyring after import"))?
            }
        };

        if !record.trust.is_trusted() {
            return Err(KeyringError::UntrustedKey {
                fingerprint: record.fingerprint.to_string(),
                trust: record.trust,
            }
            .into());
        }

        let display = name
            .map(str::to_string)
            .or(record.uid)
            .unwrap_or_else(|| key_id.to_string());

        Ok(Recipient::new(display, record.fingerprint).with_trust(record.trust))
    }

    /// The local keyring owner: the first secret key.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::NoSecretKey` if there are no secret keys.
    pub fn current_owner(&self) -> Result<Recipient> {
        let record = self
            .backend
            .secret_keys()
            .map_err(|e| resolution("<secret keys>", &e.to_string()))?
            .into_iter()
            .next()
            .ok_or(KeyringError::NoSecretKey)?;

        let name = record
            .uid
            .clone()
            .unwrap_or_else(|| record.fingerprint.to_string());
        Ok(Recipient::new(name, record.fingerprint).with_trust(record.trust))
    }

    /// The single keyring record answering to `key_id`, if any.
    fn find(&self, key_id: &str) -> Result<Option<KeyRecord>> {
        let keys = self
            .backend
            .list_keys()
            .map_err(|e| resolution(key_id, &e.to_string()))?;
        let mut found = keys.into_iter().filter(|k| k.matches(key_id));
        let first = found.next();
        if let Some(other) = found.next() {
            let first = first.as_ref().map(|k| k.fingerprint.to_string()).unwrap_or_default();
            return Err(resolution(
                key_id,
                &format!("ambiguous: matches {} and {}", first, other.fingerprint),
            ));
        }
        Ok(first)
    }
}

fn resolution(key: &str, reason: &str) -> Error {
    KeyringError::KeyResolutionFailure {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
