//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary home directory and
//! database, and verify its JSON output.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let db = home.join("vowarc.db");
    let output = Command::new(env!("CARGO_BIN_EXE_vowarc-cli"))
        .env("HOME", home)
        .env_remove("VOWARC_ENV")
        .env_remove("VOWARC_DATABASE")
        .arg("--db")
        .arg(&db)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is not JSON")
}

#[test]
fn test_small_wins_from_counts() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "stats",
            "small-wins",
            "--checkin-count",
            "5",
            "--checkin-total",
            "7",
            "--if-then-count",
            "3",
            "--if-then-total",
            "7",
            "--evidence-count",
            "2",
            "--evidence-expected",
            "7",
            "--commitment-total",
            "1",
        ],
    );
    assert_eq!(code, 0);

    let out = json(&stdout);
    let avg = out["metrics"]["averageRate"].as_f64().unwrap();
    assert!((avg - 0.357).abs() < 0.001);
    assert_eq!(out["tier"]["tier"], "medium");
}

#[test]
fn test_small_wins_all_zero() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["stats", "small-wins"]);
    assert_eq!(code, 0);

    let out = json(&stdout);
    assert_eq!(out["metrics"]["averageRate"], 0.0);
    assert_eq!(out["tier"]["tier"], "low");
}

#[test]
fn test_user_trial_flow() {
    let home = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["user", "create"]);
    assert_eq!(code, 0);
    let user_id = json(&stdout)["userId"].as_str().unwrap().to_string();

    let (code, stdout, _) = run_cli(home.path(), &["user", "accept-contract", &user_id]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["currentPhase"], "trial");

    let (code, _, _) = run_cli(
        home.path(),
        &["activity", "checkin", &user_id, "Walked after lunch", "--if-then", "true"],
    );
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(home.path(), &["activity", "evidence", &user_id, "10k steps"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(home.path(), &["stats", "user", &user_id]);
    assert_eq!(code, 0);
    let out = json(&stdout);
    assert_eq!(out["trialDay"], 1);
    assert_eq!(out["metrics"]["checkinRate"], 1.0);
    assert_eq!(out["metrics"]["ifThenRate"], 1.0);
    assert_eq!(out["metrics"]["evidenceRate"], 1.0);

    let (code, stdout, _) = run_cli(
        home.path(),
        &["user", "decide", &user_id, "revise", "--vow", "Walk every evening"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("active"));
}

#[test]
fn test_unknown_user_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["user", "show", "nobody"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("user not found"));
}

#[test]
fn test_config_get() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "evidence.max_highlights"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");
}
