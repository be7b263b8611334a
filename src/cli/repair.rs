//! Repair command - re-encrypt every object for the current recipients.

use tracing::info;

use crate::cli::{output, Context};
use crate::core::repair::RepairOptions;
use crate::error::Result;

/// Run a repair and report the result.
///
/// Per-object failures are printed and returned as one aggregate error so
/// the process exits non-zero.
pub fn execute(ctx: &Context, options: &RepairOptions, json: bool) -> Result<()> {
    info!(workers = options.workers, "running repair");

    let vault = ctx.open()?;
    let report = vault.repair(options)?;

    if json {
        output::data(&serde_json::to_string_pretty(&serde_json::json!({
            "outcome": report.outcome(),
            "report": &report,
        }))?);
    } else {
        crate::cli::team::print_repair(&report);
        for failure in &report.failures {
            output::warn(&format!("{}: {}", failure.path.display(), failure.error));
        }
    }

    report.into_result().map(|_| ())
}
