//! Vaultfile management.
//!
//! The Vaultfile is the single source of truth for who can decrypt the
//! vault: an ordered, fingerprint-unique list of recipients stored as TOML
//! at the vault root.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::core::constants::{MANIFEST_FILE, TEMP_SUFFIX};
use crate::core::domain::Recipient;
use crate::error::{ManifestError, Result};

/// Serializes Vaultfile writes within the process.
static SAVE_LOCK: Mutex<()> = Mutex::new(());

/// On-disk representation.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    recipients: Vec<Recipient>,
}

/// The recipient list of one vault.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    recipients: Vec<Recipient>,
}

impl Manifest {
    /// Path of the Vaultfile under `root`.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Whether `root` already has a Vaultfile.
    pub fn exists(root: &Path) -> bool {
        Self::path_for(root).is_file()
    }

    /// Create and save an empty Vaultfile.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::AlreadyInitialized` if one exists.
    pub fn create(root: &Path) -> Result<Self> {
        let path = Self::path_for(root);
        if path.exists() {
            return Err(ManifestError::AlreadyInitialized(path).into());
        }
        let manifest = Self {
            path,
            recipients: Vec::new(),
        };
        manifest.save()?;
        Ok(manifest)
    }

    /// Load the Vaultfile under `root`.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotInitialized` if the file doesn't exist,
    /// `ManifestError::Parse` if the TOML is malformed, or
    /// `ManifestError::Duplicate` if a fingerprint appears twice.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_for(root);
        debug!(path = %path.display(), "loading Vaultfile");

        if !path.exists() {
            return Err(ManifestError::NotInitialized(root.to_path_buf()).into());
        }
        let contents = fs::read_to_string(&path).map_err(ManifestError::ReadFile)?;
        let doc: Document = toml::from_str(&contents).map_err(ManifestError::Parse)?;

        let mut seen = HashSet::new();
        for r in &doc.recipients {
            if !seen.insert(r.fingerprint().clone()) {
                return Err(ManifestError::Duplicate(r.fingerprint().to_string()).into());
            }
        }

        debug!(recipients = doc.recipients.len(), "Vaultfile loaded");
        Ok(Self {
            path,
            recipients: doc.recipients,
        })
    }

    /// Write the Vaultfile atomically: temp file in the same directory,
    /// then rename over the target.
    pub fn save(&self) -> Result<()> {
        debug!(path = %self.path.display(), "saving Vaultfile");

        let doc = Document {
            recipients: self.recipients.clone(),
        };
        let contents = toml::to_string_pretty(&doc).map_err(ManifestError::Serialize)?;

        let parent = self.path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(".{}{}", MANIFEST_FILE, TEMP_SUFFIX));

        let _guard = SAVE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Append a recipient.
    ///
    /// Returns `false` and leaves the list untouched if the fingerprint is
    /// already present.
    pub fn add(&mut self, recipient: Recipient) -> bool {
        if self.contains(&recipient) {
            return false;
        }
        self.recipients.push(recipient);
        true
    }

    /// Remove the recipient answering to `id` (fingerprint or exact name).
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::RecipientNotFound` if nobody matches.
    pub fn remove(&mut self, id: &str) -> Result<Recipient> {
        let index = self
            .recipients
            .iter()
            .position(|r| r.answers_to(id))
            .ok_or_else(|| ManifestError::RecipientNotFound(id.to_string()))?;
        Ok(self.recipients.remove(index))
    }

    /// Find the recipient answering to `id`.
    pub fn find(&self, id: &str) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.answers_to(id))
    }

    /// Whether a recipient with the same fingerprint is listed.
    pub fn contains(&self, recipient: &Recipient) -> bool {
        self.recipients.contains(recipient)
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
