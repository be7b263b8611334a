//! Recipient operations.
//!
//! Every change to the recipient set is saved to the Vaultfile first and
//! then followed by a repair, so all objects answer to the new set.

use std::collections::HashMap;

use tracing::info;

use super::Vault;
use crate::core::domain::{Mutation, Recipient, RepairReport, TrustLevel};
use crate::core::registry::Registry;
use crate::core::repair::{Repair, RepairOptions};
use crate::error::{ManifestError, Result};

impl Vault {
    /// Grant `key_id` (fingerprint, long key id or email) access.
    ///
    /// A recipient already in the Vaultfile is a no-op: nothing is saved and
    /// no repair runs. Otherwise the key is validated against the keyring,
    /// appended, saved, and every object is re-encrypted.
    ///
    /// # Errors
    ///
    /// Returns `KeyringError::UntrustedKey` or
    /// `KeyringError::KeyResolutionFailure` if validation fails; the
    /// Vaultfile is left unchanged in that case.
    pub fn add_recipient(
        &mut self,
        key_id: &str,
        name: Option<&str>,
        options: &RepairOptions,
    ) -> Result<Mutation> {
        if let Some(existing) = self.manifest.find(key_id.trim()) {
            info!(recipient = %existing, "recipient already present");
            return Ok(Mutation::Unchanged);
        }

        let recipient = Registry::new(self.store.backend()).validate(key_id, name)?;
        let label = recipient.to_string();
        if !self.manifest.add(recipient) {
            info!(recipient = %label, "recipient already present");
            return Ok(Mutation::Unchanged);
        }
        self.manifest.save()?;
        info!(recipient = %label, "added recipient");

        Ok(Mutation::Applied(self.repair_after_change(options)?))
    }

    /// Grant the local keyring owner access.
    pub fn add_owner(&mut self, options: &RepairOptions) -> Result<Mutation> {
        let owner = Registry::new(self.store.backend()).current_owner()?;
        let fingerprint = owner.fingerprint().to_string();
        self.add_recipient(&fingerprint, Some(owner.name()), options)
    }

    /// Revoke access for the recipient answering to `id` (fingerprint or
    /// name) and re-encrypt every object without them.
    ///
    /// With `purge_key`, their public key is also deleted from the keyring
    /// once repair has run.
    ///
    /// # Errors
    ///
    /// - `ManifestError::RecipientNotFound` if nobody matches.
    /// - `ManifestError::NoRecipients` if this is the last recipient and the
    ///   vault still holds objects; the Vaultfile is left unchanged.
    pub fn remove_recipient(
        &mut self,
        id: &str,
        purge_key: bool,
        options: &RepairOptions,
    ) -> Result<Mutation> {
        let id = id.trim();
        if self.manifest.find(id).is_none() {
            return Err(ManifestError::RecipientNotFound(id.to_string()).into());
        }
        if self.manifest.len() == 1 && !self.store.list_all()?.is_empty() {
            return Err(ManifestError::NoRecipients.into());
        }

        let removed = self.manifest.remove(id)?;
        self.manifest.save()?;
        info!(recipient = %removed, "removed recipient");

        let report = if self.manifest.is_empty() {
            RepairReport::default()
        } else {
            self.repair_after_change(options)?
        };

        if purge_key {
            self.store.backend().delete_key(&removed)?;
        }

        Ok(Mutation::Applied(report))
    }

    /// Recipients with the trust the keyring currently assigns them.
    ///
    /// `None` means the key is no longer in the keyring.
    pub fn recipients_with_trust(&self) -> Result<Vec<(Recipient, Option<TrustLevel>)>> {
        let trust: HashMap<_, _> = self
            .store
            .backend()
            .list_keys()?
            .into_iter()
            .map(|k| (k.fingerprint, k.trust))
            .collect();

        Ok(self
            .manifest
            .recipients()
            .iter()
            .map(|r| (r.clone(), trust.get(r.fingerprint()).copied()))
            .collect())
    }

    fn repair_after_change(&self, options: &RepairOptions) -> Result<RepairReport> {
        Repair::with_options(&self.store, options.clone()).run(self.manifest.recipients())
    }
}
