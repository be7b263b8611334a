//! Recipient commands.
//!
//! Add, list, and remove recipients.

mod add;
mod list;
mod rm;

pub use add::execute as add;
pub use list::execute as list;
pub use rm::execute as rm;

use crate::cli::output;
use crate::core::domain::{Mutation, RepairReport};

/// Summarize the repair that followed a recipient change.
fn report_repair(change: &Mutation) {
    if let Some(report) = change.report() {
        print_repair(report);
    }
}

pub(crate) fn print_repair(report: &RepairReport) {
    if report.objects == 0 {
        output::dimmed("no objects to re-encrypt");
        return;
    }
    output::success(&format!(
        "re-encrypted {} of {} objects",
        output::count(report.repaired.len()),
        report.objects
    ));
    if !report.skipped.is_empty() {
        output::warn(&format!("{} objects skipped", report.skipped.len()));
        output::hint("run `gpgvault repair` to re-encrypt the rest");
    }
}
