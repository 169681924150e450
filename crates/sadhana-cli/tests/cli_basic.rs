//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temporary directory so the config file written
//! on first load never touches the real one.

use std::io::Write;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &std::path::Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "sadhana-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env_remove("SADHANA_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_round_lists_seven_chakras() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["round"]);
    assert_eq!(code, 0, "round failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let stages = parsed.as_array().unwrap();
    assert_eq!(stages.len(), 7);
    assert_eq!(stages[0]["name"], "Wortel (Muladhara)");
    assert_eq!(stages[0]["breathing_audio"], "/audio/Breathing-chakra-1.mp3");
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "api.base_url"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "http://localhost:3000");
    assert!(home.path().join(".config/sadhana/config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "simulation.clip_secs", "1"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "simulation.clip_secs"]);
    assert_eq!(stdout.trim(), "1");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "api.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: unknown key: api.nope"));

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "session.auto_continue", "soms"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("session.auto_continue"));
}

#[test]
fn test_config_rejects_oversized_clip_length() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["config", "set", "simulation.clip_secs", "10000000000000000"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("simulation.clip_secs"));

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "simulation.clip_secs"]);
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_config_list_is_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["simulation"]["wake_lock"], "supported");
}

#[test]
fn test_stats_requires_a_user() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["stats"]);
    assert_ne!(code, 0);
}

#[test]
fn test_session_acknowledge_then_quit() {
    let home = tempfile::tempdir().unwrap();
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "sadhana-cli", "--", "session", "--guest"])
        .env("HOME", home.path())
        .env_remove("SADHANA_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"\nq\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "PhaseChanged");
    assert_eq!(first["from"], "DISCLAIMER");
    assert_eq!(first["to"], "AUTH");
}
