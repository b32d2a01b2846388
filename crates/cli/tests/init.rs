// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use yare::parameterized;

#[test]
fn creates_relief_dir() {
    let temp = TempDir::new().unwrap();

    relief()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized relief"))
        .stdout(predicate::str::contains("Remote: none"));

    assert!(temp.path().join(".relief/config.toml").exists());
    assert!(temp.path().join(".relief/local.db").exists());
    assert!(temp.path().join(".relief/.gitignore").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    relief()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn records_owner_role_and_remote() {
    let temp = TempDir::new().unwrap();

    relief()
        .args(["init", "--owner", OWNER, "--role", "victim", "--remote", "ws://127.0.0.1:7890"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Owner: {OWNER}")))
        .stdout(predicate::str::contains("Role: victim"))
        .stdout(predicate::str::contains("Remote: ws://127.0.0.1:7890"));

    let config = std::fs::read_to_string(temp.path().join(".relief/config.toml")).unwrap();
    assert!(config.contains(OWNER));
    assert!(config.contains("ws://127.0.0.1:7890"));
}

#[parameterized(
    bad_owner = { &["init", "--owner", "not-a-uuid"], "invalid owner id" },
    bad_remote = { &["init", "--remote", "http://example.com"], "invalid remote URL" },
)]
fn rejects_invalid_settings(args: &[&str], message: &str) {
    let temp = TempDir::new().unwrap();

    relief()
        .args(args)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(message));

    assert!(!temp.path().join(".relief/config.toml").exists());
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();

    relief()
        .arg("status")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 'relief init' first"));
}
