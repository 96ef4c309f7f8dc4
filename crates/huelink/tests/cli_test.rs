//! Integration tests for the `huelink` CLI binary.
//!
//! Argument parsing, config handling and error exits, without a bridge.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `huelink` with all `HUELINK_*` variables cleared and config
/// directories pointed at a nonexistent path.
fn huelink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("huelink");
    cmd.env("HOME", "/tmp/huelink-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/huelink-cli-test-nonexistent")
        .env_remove("HUELINK_CONFIG")
        .env_remove("HUELINK_HOST")
        .env_remove("HUELINK_USERNAME")
        .env_remove("HUELINK_BRIDGE__HOST")
        .env_remove("HUELINK_BRIDGE__USERNAME")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = huelink_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    huelink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Hue bridge")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("pair")),
    );
}

#[test]
fn test_version_flag() {
    huelink_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("huelink"));
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_set_requires_a_change() {
    huelink_cmd().args(["set", "1"]).assert().code(2);
}

#[test]
fn test_set_rejects_out_of_range_brightness() {
    huelink_cmd()
        .args(["set", "1", "--bri", "255"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("255"));
}

#[test]
fn test_set_on_and_off_conflict() {
    huelink_cmd()
        .args(["set", "1", "--on", "--off"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_list_kind() {
    huelink_cmd().args(["list", "scenes"]).assert().code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_config_toml() {
    huelink_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("huelink").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_show_redacts_username() {
    let file = config_file(
        r#"
[bridge]
host = "192.168.1.20"
username = "s3cr3t-whitelist-entry"
"#,
    );
    huelink_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("host = \"192.168.1.20\"")
                .and(predicate::str::contains("username = \"****\""))
                .and(predicate::str::contains("s3cr3t").not())
                .and(predicate::str::contains("# error").not()),
        );
}

#[test]
fn test_config_show_reports_missing_host() {
    let file = config_file("[bridge]\nprotocol = \"http\"\n");
    huelink_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# error: no bridge host configured"));
}

#[test]
fn test_host_flag_overrides_config_file() {
    let file = config_file("[bridge]\nhost = \"192.168.1.20\"\n");
    huelink_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["--host", "10.1.1.1", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.1.1.1"));
}

#[test]
fn test_invalid_protocol_is_a_usage_error() {
    let file = config_file("[bridge]\nhost = \"192.168.1.20\"\nprotocol = \"ftp\"\n");
    huelink_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["list", "lights"])
        .assert()
        .code(2);
}

// ── Error exits ─────────────────────────────────────────────────────

#[test]
fn test_list_without_host_fails() {
    let output = huelink_cmd().args(["list", "lights"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No bridge host"),
        "Expected 'No bridge host' in output:\n{text}"
    );
}

#[test]
fn test_unreachable_bridge_is_a_connection_error() {
    let file = config_file("[bridge]\nhost = \"127.0.0.1\"\nport = 9\ntimeout = 2\n");
    huelink_cmd()
        .arg("--config")
        .arg(file.path())
        .env("HUELINK_USERNAME", "test-username")
        .args(["list", "lights"])
        .assert()
        .code(7);
}
