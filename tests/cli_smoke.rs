//! Smoke tests for the `caja` binary

mod common;

use assert_cmd::Command;
use common::temp_config_file;
use predicates::prelude::*;
use tempfile::TempDir;

fn caja(storage: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("caja").expect("binary builds");
    cmd.env_remove("CAJA_SESSION_DB")
        .arg("--config")
        .arg(storage.path().join("missing.yaml"))
        .arg("--storage-path")
        .arg(storage.path().join("sessions.db"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("caja")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("sessions"));
}

#[test]
fn test_sessions_create_then_list() {
    let tmp = TempDir::new().unwrap();

    caja(&tmp)
        .args(["sessions", "create", "--name", "groceries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created session"));

    caja(&tmp)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("groceries"));
}

#[test]
fn test_sessions_list_empty() {
    let tmp = TempDir::new().unwrap();
    caja(&tmp)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions found."));
}

#[test]
fn test_delete_unknown_session_fails() {
    let tmp = TempDir::new().unwrap();
    caja(&tmp)
        .args(["sessions", "delete", "missing-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let (_dir, config_path) = temp_config_file("provider:\n  type: carrier-pigeon\n");

    Command::cargo_bin("caja")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("--storage-path")
        .arg(tmp.path().join("sessions.db"))
        .args(["sessions", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type"));
}
