//! Shared E2E test helpers for `relay` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::Path;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Environment variables read by the config loader.
const RELAY_VARS: &[&str] = &[
    "RELAY_DEBUG",
    "RELAY_STREAM_TTL_SECS",
    "RELAY_SWEEP_INTERVAL_SECS",
    "RELAY_QUEUE_CAPACITY",
    "RELAY_WRITE_TIMEOUT_MS",
    "RELAY_IDLE_TIMEOUT_MS",
    "RELAY_INVOKE_TIMEOUT_MS",
    "RELAY_LOG_FILE",
    "RELAY_LOG_LEVEL",
    "RUST_LOG",
];

/// Build a Command for the `relay` binary isolated from the user's setup.
///
/// HOME points at a fresh temp dir (no global config), the project root
/// is the same dir, and `RELAY_*` variables are cleared. Keep the guard
/// alive for the test's duration.
pub fn relay_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp home");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("relay");
    cmd.timeout(TIMEOUT_BASIC);
    for var in RELAY_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", tmp.path());
    cmd.args(["-C", tmp.path().to_str().expect("valid utf8")]);
    (cmd, tmp)
}

/// Writes `<root>/.relay/config.toml`.
pub fn write_project_config(root: &Path, content: &str) {
    let dir = root.join(".relay");
    std::fs::create_dir_all(&dir).expect("create .relay dir");
    std::fs::write(dir.join("config.toml"), content).expect("write project config");
}
