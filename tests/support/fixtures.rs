//! Test fixtures and constants.

pub const BOB: &str = "B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0";
pub const ALICE: &str = "A11CEA11CEA11CEA11CEA11CEA11CEA11CEA11CE";
pub const CAROL: &str = "CA401CA401CA401CA401CA401CA401CA401CA401";
pub const MALLORY: &str = "4A11044A11044A11044A11044A11044A11044A11";

/// Objects used across scenarios.
pub const STANDARD_OBJECTS: &[(&str, &str)] = &[
    ("db/password", "hunter2"),
    ("api/token", "sk-test-12345"),
    ("certs/server.pem", "-----BEGIN CERTIFICATE-----"),
];

/// Vaultfile text for `(name, fingerprint)` pairs.
pub fn vaultfile(recipients: &[(&str, &str)]) -> String {
    recipients
        .iter()
        .map(|(name, fpr)| format!("[[recipients]]\nname = \"{name}\"\nfingerprint = \"{fpr}\"\n"))
        .collect::<Vec<_>>()
        .join("\n")
}
