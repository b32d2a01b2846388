// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub const OWNER: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

pub fn relief() -> Command {
    cargo_bin_cmd!("relief")
}

/// Helper to create an initialized temp directory with no remote
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    relief()
        .arg("init")
        .arg("--owner")
        .arg(OWNER)
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to run a command in `temp` and return its stdout
pub fn stdout(temp: &TempDir, args: &[&str]) -> String {
    let output = relief().args(args).current_dir(temp.path()).output().unwrap();
    assert!(output.status.success(), "relief {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).into_owned()
}
