//! Add command - grant a key access.

use tracing::info;

use crate::cli::{output, Context};
use crate::core::domain::Mutation;
use crate::core::repair::RepairOptions;
use crate::error::Result;

/// Add a recipient and re-encrypt the vault for them.
pub fn execute(ctx: &Context, key: &str, name: Option<&str>, options: &RepairOptions) -> Result<()> {
    info!(key, "adding recipient");
    let mut vault = ctx.open()?;

    let change = vault.add_recipient(key, name, options)?;
    if change == Mutation::Unchanged {
        output::dimmed(&format!("{} is already a recipient", key));
        return Ok(());
    }

    if let Some(added) = vault.recipients().last() {
        output::success(&format!("added {}", added));
        if let Some(trust) = added.trust() {
            output::kv("trust:", trust);
        }
    }
    super::report_repair(&change);
    if let Some(report) = change.report() {
        report.clone().into_result()?;
    }
    Ok(())
}
