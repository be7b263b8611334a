//! Init command - create a Vaultfile.

use tracing::info;

use crate::cli::{output, Context};
use crate::core::manifest::Manifest;
use crate::core::repair::RepairOptions;
use crate::core::Vault;
use crate::error::{ManifestError, Result};

/// Initialize a vault at the configured root.
///
/// Unless `empty` is set, the first secret key in the local keyring becomes
/// the first recipient.
pub fn execute(ctx: &Context, empty: bool) -> Result<()> {
    info!(root = %ctx.root.display(), empty, "initializing vault");
    if Manifest::exists(&ctx.root) {
        return Err(ManifestError::AlreadyInitialized(Manifest::path_for(&ctx.root)).into());
    }

    let backend = ctx.backend()?;
    let mut vault = Vault::init(&ctx.root, backend)?;
    output::success(&format!(
        "initialized {}",
        output::path(vault.manifest().path().display())
    ));

    if empty {
        output::hint("add a recipient with: gpgvault add <key>");
        return Ok(());
    }

    vault.add_owner(&RepairOptions::default())?;
    if let Some(owner) = vault.recipients().first() {
        output::kv("recipient:", owner);
    }
    Ok(())
}
