//! Tests for error handling and CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();
    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("recipients"))
        .stdout(predicate::str::contains("repair"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();
    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();
    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpgvault"));
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();
    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gpgvault"));
}

#[test]
fn test_ls_without_vaultfile() {
    let t = Test::new();
    let output = t.ls();
    assert_failure(&output);
    assert_stderr_contains(&output, "not initialized");
    assert_stderr_contains(&output, "gpgvault init");
}

#[test]
fn test_get_without_vaultfile() {
    let t = Test::new();
    t.cmd()
        .args(["get", "db/password"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_recipients_without_vaultfile() {
    let t = Test::new();
    t.cmd()
        .args(["recipients", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_vault_flag_points_elsewhere() {
    let t = Test::with_vaultfile(&[]);
    let elsewhere = tempfile::TempDir::new().unwrap();
    t.cmd()
        .args(["--vault"])
        .arg(elsewhere.path())
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_vault_env_points_elsewhere() {
    let t = Test::with_vaultfile(&[]);
    let elsewhere = tempfile::TempDir::new().unwrap();
    t.cmd()
        .env("GPGVAULT_DIR", elsewhere.path())
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_init_twice_fails() {
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    let before = std::fs::read_to_string(t.dir.path().join("Vaultfile")).unwrap();

    t.cmd()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
    assert_eq!(
        std::fs::read_to_string(t.dir.path().join("Vaultfile")).unwrap(),
        before
    );
}

#[test]
fn test_set_conflicting_sources_rejected() {
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    t.cmd()
        .args(["set", "x", "value", "--file", "plain.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
