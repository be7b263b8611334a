//! Recipients command.

use crate::cli::{output, Context};
use crate::error::Result;

/// List recipients with their current keyring trust.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let vault = ctx.open()?;
    let recipients = vault.recipients_with_trust()?;

    if json {
        let entries: Vec<_> = recipients
            .iter()
            .map(|(r, trust)| {
                serde_json::json!({
                    "name": r.name(),
                    "fingerprint": r.fingerprint(),
                    "trust": trust.map(|t| t.to_string()),
                })
            })
            .collect();

        let result = serde_json::json!({
            "recipients": entries,
            "count": recipients.len()
        });
        output::data(&serde_json::to_string_pretty(&result)?);
    } else if recipients.is_empty() {
        output::dimmed("no recipients");
    } else {
        output::blank();
        output::header(&format!("{} recipients", output::count(recipients.len())));
        output::rule();
        for (recipient, trust) in &recipients {
            let trust = trust
                .map(|t| t.to_string())
                .unwrap_or_else(|| "missing from keyring".to_string());
            output::kv(
                recipient.name(),
                format!("{} ({})", recipient.fingerprint(), trust),
            );
        }
    }

    Ok(())
}
