//! gpgvault - A git-friendly encrypted file vault for GnuPG recipients.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gpgvault::cli::output;
use gpgvault::cli::{execute, Cli};
use gpgvault::core::constants::LOG_ENV;
use gpgvault::error::{BackendError, Error, KeyringError, ManifestError, RepairError, StoreError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("gpgvault=debug")
        } else {
            EnvFilter::new("gpgvault=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Manifest(ManifestError::NotInitialized(_)) => Some("run: gpgvault init"),
            Error::Manifest(ManifestError::NoRecipients) => Some("run: gpgvault add <key>"),
            Error::Keyring(KeyringError::UntrustedKey { .. }) => {
                Some("verify the key, then: gpg --lsign-key <fingerprint>")
            }
            Error::Keyring(KeyringError::NoSecretKey) => {
                Some("create one with: gpg --full-generate-key")
            }
            Error::Backend(BackendError::NotInstalled) => Some("install GnuPG and retry"),
            Error::Store(StoreError::PathTraversal(_)) => {
                Some("object paths are relative to the vault root")
            }
            Error::Repair(RepairError::PartialFailure { .. }) => {
                Some("fix the listed objects, then: gpgvault repair")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
