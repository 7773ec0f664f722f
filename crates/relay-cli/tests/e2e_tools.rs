//! E2E tests for the `relay` binary.
//!
//! Spoken text and the final reply go to stdout; tracing output goes to
//! stderr.

mod common;

use common::{relay_cmd, write_project_config};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

// ─── Weather ───────────────────────────────────────────────────────

#[test]
fn weather_celsius() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["get_current_weather", "Paris", "celsius"])
        .assert()
        .success()
        .stdout(contains("In Paris, it's 22°C and clear."));
}

#[test]
fn weather_fahrenheit_multi_word_location() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["get_current_weather", "San", "Francisco,", "CA", "fahrenheit"])
        .assert()
        .success()
        .stdout(contains("In San Francisco, CA, it's 72°F and clear."));
}

#[test]
fn weather_defaults_to_celsius() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["get_current_weather", "Tokyo"])
        .assert()
        .success()
        .stdout(contains("22°C"));
}

#[test]
fn weather_does_not_speak() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["get_current_weather", "Oslo"])
        .assert()
        .success()
        .stdout(contains("speak:").not());
}

// ─── Dispatch ──────────────────────────────────────────────────────

#[test]
fn unknown_function_fails() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.arg("tell_time")
        .assert()
        .failure()
        .code(1)
        .stdout(contains("Unknown function: tell_time"));
}

#[test]
fn missing_tool_is_usage_error() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.assert().failure().stderr(contains("Usage"));
}

// ─── Secret code streaming ─────────────────────────────────────────

#[test]
fn secret_code_speaks_digits_in_order() {
    let (mut cmd, _guard) = relay_cmd();
    let output = cmd
        .args(["--step-delay-ms", "1", "secret_code", "what", "is", "the", "code"])
        .output()
        .expect("run relay");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "speak: Digit 1 is 1",
            "speak: Digit 2 is 2",
            "speak: Digit 3 is 3",
            "speak: Digit 4 is 4",
            "Secret code retrieval complete!",
        ]
    );
}

#[test]
fn secret_code_from_flag() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["--step-delay-ms", "1", "--code", "42", "secret_code"])
        .assert()
        .success()
        .stdout(contains("speak: Digit 1 is 4"))
        .stdout(contains("speak: Digit 2 is 2"))
        .stdout(contains("Digit 3").not());
}

#[test]
fn secret_code_from_project_config() {
    let (mut cmd, guard) = relay_cmd();
    write_project_config(
        guard.path(),
        r#"
[agent]
secret_code = "7"
step_delay_ms = 1
"#,
    );

    cmd.arg("secret_code")
        .assert()
        .success()
        .stdout(contains("speak: Digit 1 is 7"));
}

#[test]
fn invoke_timeout_reports_error() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args([
        "--step-delay-ms",
        "2000",
        "--invoke-timeout-ms",
        "200",
        "secret_code",
    ])
    .assert()
    .failure()
    .stdout(contains("Error: Streaming timeout"));
}

#[test]
fn invoke_timeout_from_env() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.env("RELAY_INVOKE_TIMEOUT_MS", "200")
        .args(["--step-delay-ms", "2000", "secret_code"])
        .assert()
        .failure()
        .stdout(contains("Error: Streaming timeout"));
}

// ─── Config / logging ──────────────────────────────────────────────

#[test]
fn invalid_project_config_is_rejected() {
    let (mut cmd, guard) = relay_cmd();
    write_project_config(guard.path(), "[timeouts]\nidle_ms = 0\n");

    cmd.arg("secret_code")
        .assert()
        .failure()
        .stderr(contains("Config error"));
}

#[test]
fn malformed_env_var_is_rejected() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.env("RELAY_QUEUE_CAPACITY", "lots")
        .arg("get_current_weather")
        .arg("Paris")
        .assert()
        .failure()
        .stderr(contains("RELAY_QUEUE_CAPACITY"));
}

#[test]
fn debug_logs_go_to_stderr() {
    let (mut cmd, _guard) = relay_cmd();
    cmd.args(["-d", "--step-delay-ms", "1", "secret_code"])
        .assert()
        .success()
        .stderr(contains("Invocation cleaned up"))
        .stdout(contains("Invocation cleaned up").not());
}

#[test]
fn log_file_receives_invocation_logs() {
    let (mut cmd, guard) = relay_cmd();
    let log_dir = guard.path().join("logs");

    cmd.args([
        "--log-file",
        log_dir.to_str().expect("valid utf8"),
        "--step-delay-ms",
        "1",
        "secret_code",
    ])
    .assert()
    .success();

    let content = std::fs::read_to_string(log_dir.join("relay.log")).expect("log file written");
    assert!(content.contains("Invocation cleaned up"), "{content}");
    assert!(content.contains("Drain complete"), "{content}");
}
