//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR via `console`):
//! - Green: success
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: paths, hints
//! - Bold: headers, values
//! - Dim: secondary info
//!
//! Status lines go to stderr so stdout stays clean for decrypted data and
//! JSON.

use console::style;
use std::fmt::Display;
use std::io::{self, Write};

const RULE_WIDTH: usize = 56;

/// Print a success message with checkmark.
///
/// Example: `✓ added alice@example.com`
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✓").green(), msg);
}

/// Print an error message.
///
/// Example: `✗ object not found: db/password`
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow(), msg);
}

/// Print a hint message.
///
/// Example: `→ run: gpgvault init`
pub fn hint(msg: &str) {
    eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
}

/// Print a bold header.
pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Print a key-value pair (label dimmed, value bold).
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

/// Print a horizontal rule.
pub fn rule() {
    println!("{}", style("─".repeat(RULE_WIDTH)).dim());
}

/// Print a dimmed line.
pub fn dimmed(msg: &str) {
    eprintln!("{}", style(msg).dim());
}

/// Print an empty line.
pub fn blank() {
    println!();
}

/// Format a path in cyan for inline use.
pub fn path(p: impl Display) -> String {
    style(p).cyan().to_string()
}

/// Format a count in bold for inline use.
pub fn count(n: usize) -> String {
    style(n).bold().to_string()
}

/// Write machine-readable output to stdout, unstyled.
pub fn data(text: &str) {
    println!("{}", text);
}

/// Write raw bytes (decrypted plaintext) to stdout.
pub fn raw(bytes: &[u8]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()
}
