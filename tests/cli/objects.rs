//! Object commands that only need `gpg` on PATH, not any keys.

use crate::skip_without_gpg;
use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_ls_empty_vault() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    let output = t.ls();
    assert_success(&output);
    assert!(stdout(&output).is_empty());
    assert_stderr_contains(&output, "no objects stored");
}

#[test]
fn test_ls_json_lists_existing_objects() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    std::fs::create_dir_all(t.dir.path().join("db")).unwrap();
    std::fs::write(t.dir.path().join("db/password.asc"), "ciphertext").unwrap();
    std::fs::write(t.dir.path().join("notes.txt"), "plain").unwrap();

    t.cmd()
        .args(["ls", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"db/password\""))
        .stdout(predicate::str::contains("\"count\": 1"));
}

#[test]
fn test_set_rejects_traversal() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    let output = t.set("../escape", "x");
    assert_failure(&output);
    assert_stderr_contains(&output, "escapes the vault root");
    assert!(!t.dir.path().join("../escape.asc").exists());
}

#[test]
fn test_set_without_recipients() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[]);
    let output = t.set("x", "value");
    assert_failure(&output);
    assert_stderr_contains(&output, "no recipients");
}

#[test]
fn test_get_missing_object() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    let output = t.get("nope");
    assert_failure(&output);
    assert_stderr_contains(&output, "object not found");
}

#[test]
fn test_repair_empty_vault() {
    skip_without_gpg!();
    let t = Test::with_vaultfile(&[("bob@example.com", BOB)]);
    t.cmd()
        .args(["repair", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\": \"clean\""));
}
