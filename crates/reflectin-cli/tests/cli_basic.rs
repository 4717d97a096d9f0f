//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own throwaway home
//! directory, so config writes never touch the real one.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &TempDir, args: &[&str], stdin: Option<&str>) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_reflectin"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("REFLECTIN_ENV")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn delay_report(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args, None);
    assert_eq!(code, 0, "delay failed: {stderr}");
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_delay_low_score_is_short_tier() {
    let home = TempDir::new().unwrap();
    let report = delay_report(&home, &["delay", "--score", "4"]);
    assert_eq!(report["tier"], "short");
    assert_eq!(report["delay_secs"], 30);
}

#[test]
fn test_delay_high_score_is_long_tier() {
    let home = TempDir::new().unwrap();
    let report = delay_report(&home, &["delay", "--score", "9.5"]);
    assert_eq!(report["tier"], "long");
    assert_eq!(report["delay_secs"], 75);
}

#[test]
fn test_delay_without_score_is_medium_tier() {
    let home = TempDir::new().unwrap();
    let report = delay_report(&home, &["delay"]);
    assert_eq!(report["tier"], "medium");
    assert_eq!(report["delay_secs"], 15);
    assert!(report["score"].is_null());
}

#[test]
fn test_delay_accepts_negative_scores() {
    let home = TempDir::new().unwrap();
    let report = delay_report(&home, &["delay", "--score", "-2"]);
    assert_eq!(report["tier"], "short");
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["config", "set", "reminder.base_delay_secs", "20"], None);
    assert_eq!(code, 0, "config set failed: {stderr}");

    let (code, stdout, _) = run_cli(&home, &["config", "get", "reminder.base_delay_secs"], None);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "20");

    let report = delay_report(&home, &["delay"]);
    assert_eq!(report["delay_secs"], 20);
}

#[test]
fn test_config_rejects_crossed_thresholds() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["config", "set", "reminder.low_threshold", "8"], None);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, stdout, _) = run_cli(&home, &["config", "get", "reminder.low_threshold"], None);
    assert_eq!(stdout.trim(), "4.0");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["config", "get", "reminder.nope"], None);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["config", "path"], None);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(".config"));
}

#[test]
fn test_chat_quit_exits_cleanly() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["chat"], Some("/quit\n"));
    assert_eq!(code, 0, "chat failed: {stderr}");
}

#[test]
fn test_chat_eof_prints_empty_transcript() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["chat", "--json"], Some(""));
    assert_eq!(code, 0);
    let json_start = stdout.find('{').unwrap();
    let transcript: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(transcript["messages"].as_array().unwrap().len(), 0);
}

#[test]
fn test_chat_rejects_bad_base_url() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["chat", "--base-url", "not a url"], Some("/quit\n"));
    assert_ne!(code, 0);
    assert!(stderr.contains("error: Configuration error"));
    assert!(stderr.contains("backend.base_url"));
}
