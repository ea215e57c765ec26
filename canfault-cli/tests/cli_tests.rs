//! End-to-end tests for the `canfault` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

fn bundled_scenarios() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenarios/basic_scenarios.json")
}

/// Run the binary inside `dir` so no stray `canfault.toml` is picked up.
fn canfault(dir: &tempfile::TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_canfault"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn canfault")
}

#[test]
fn validate_bundled_scenarios_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = bundled_scenarios();
    let output = canfault(
        &dir,
        &["validate", path.to_str().expect("utf-8 path"), "--output", "json"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let scenarios = json["scenarios"].as_array().expect("scenarios array");
    assert_eq!(scenarios.len(), 5);
    assert!(scenarios.iter().all(|s| s.get("error").is_none()));
}

#[test]
fn validate_invalid_scenario_exits_with_scenario_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"[{ "id": 1, "name": "no data", "faults": [ { "type": "frozen_value", "can_id": "0x200", "duration": 1 } ] }]"#,
    )
    .expect("write");

    let output = canfault(&dir, &["validate", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no data"));
}

#[test]
fn malformed_scenario_file_exits_with_scenario_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write");

    let output = canfault(&dir, &["validate", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn config_validate_reports_invalid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[general]\nlog_level = \"loud\"\n").expect("write");

    let output = canfault(
        &dir,
        &["--config", path.to_str().expect("utf-8 path"), "config", "validate", "--output", "json"],
    );
    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(json["valid"], false);
}

#[test]
fn config_show_without_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = canfault(&dir, &["config", "show", "--section", "injector"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(defaults)"));
    assert!(stdout.contains("max_flood_rate"));
}

#[test]
fn inject_missing_reports_no_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = canfault(
        &dir,
        &["inject", "missing", "--can-id", "0x1A0", "-d", "0.05", "--output", "json"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(json["report"]["frames_sent"], 0);
}

#[test]
fn inject_rejects_bad_can_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = canfault(&dir, &["inject", "missing", "--can-id", "0xZZ", "-d", "0.05"]);
    assert_eq!(output.status.code(), Some(1));
}
