//! Object commands.
//!
//! Implements set, get, and ls.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::{output, Context};
use crate::core::domain::PlaintextSource;
use crate::error::Result;

/// Encrypt a value, file, or stdin into the vault.
///
/// With neither `value` nor `file`, plaintext is read from stdin.
pub fn set(ctx: &Context, path: &str, value: Option<&str>, file: Option<PathBuf>) -> Result<()> {
    let source = match (value, file) {
        (_, Some(file)) => PlaintextSource::File(file),
        (Some(value), None) => PlaintextSource::from_arg(value),
        (None, None) => PlaintextSource::Stdin,
    };
    info!(path, "setting object");

    let vault = ctx.open()?;
    let written = vault.set(path, &source)?;
    output::success(&format!(
        "encrypted {} for {} recipients",
        output::path(written.display()),
        vault.recipients().len()
    ));
    Ok(())
}

/// Decrypt an object to stdout or a file.
pub fn get(ctx: &Context, path: &str, dest: Option<&Path>) -> Result<()> {
    let vault = ctx.open()?;
    match dest {
        Some(dest) => {
            vault.get_to_file(path, dest)?;
            output::success(&format!("decrypted to {}", output::path(dest.display())));
        }
        None => output::raw(&vault.get(path)?)?,
    }
    Ok(())
}

/// List object paths.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let vault = ctx.open()?;
    let objects = vault.list()?;

    if json {
        let result = serde_json::json!({
            "objects": objects,
            "count": objects.len()
        });
        output::data(&serde_json::to_string_pretty(&result)?);
    } else if objects.is_empty() {
        output::dimmed("no objects stored");
    } else {
        for object in &objects {
            output::data(object);
        }
    }
    Ok(())
}
