//! Rm command - revoke a recipient.

use crate::cli::{output, Context};
use crate::core::repair::RepairOptions;
use crate::error::Result;

/// Remove a recipient and re-encrypt the vault without them.
pub fn execute(ctx: &Context, id: &str, purge_key: bool, options: &RepairOptions) -> Result<()> {
    let mut vault = ctx.open()?;
    let change = vault.remove_recipient(id, purge_key, options)?;

    output::success(&format!("removed {}", id));
    if purge_key {
        output::dimmed("public key deleted from keyring");
    }
    super::report_repair(&change);
    if let Some(report) = change.report() {
        report.clone().into_result()?;
    }
    Ok(())
}
