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

/// `fos-sync` with a clean environment pointing at `state`.
pub fn fos(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fos-sync");
    cmd.arg("-C")
        .arg(state.path())
        .env_remove("FOS_SYNC_DIR")
        .env_remove("FOS_SYNC_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized state directory for `url`.
pub fn init_state(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fos(&temp)
        .args(["init", "--url", url, "--token", "test-token", "--client-id", "client-test"])
        .assert()
        .success();
    temp
}

/// Helper to enqueue an entry and return its id.
pub fn enqueue(state: &TempDir, args: &[&str]) -> String {
    let output = fos(state).arg("enqueue").args(args).output().unwrap();
    assert!(output.status.success(), "enqueue failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
