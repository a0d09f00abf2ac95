//! CLI end-to-end tests.
//!
//! These tests spawn the actual `tugast` binary and validate stdout/exit codes.
//!
//! Exit code expectations:
//! - 0: Success
//! - 2: Invalid arguments (unknown node type name)
//! - 3: Input error (missing file, malformed JSON, unrecognized node)

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run tugast with given arguments and return (stdout, stderr, exit_code).
fn run_tugast(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tugast"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute tugast");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn stats_returns_exit_0_and_counts() {
    let (stdout, _stderr, exit_code) = run_tugast(&["stats", &fixture("mixed.json")]);
    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["total_nodes"], 11);
}

#[test]
fn compact_flag_emits_one_line() {
    let (stdout, _stderr, exit_code) =
        run_tugast(&["parens", &fixture("mixed.json"), "--compact"]);
    assert_eq!(exit_code, 0);
    assert_eq!(stdout.trim_end().lines().count(), 1);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["paths"][0]["path"], "body.0.expression.left");
}

#[test]
fn prune_prints_rewritten_tree() {
    let (stdout, _stderr, exit_code) = run_tugast(&[
        "prune",
        &fixture("mixed.json"),
        "--type",
        "EmptyStatement",
    ]);
    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["pruned"], 1);
    assert_eq!(json["tree"]["body"].as_array().map(Vec::len), Some(2));
}

#[test]
fn unknown_node_type_returns_exit_2() {
    let (stdout, _stderr, exit_code) =
        run_tugast(&["prune", &fixture("mixed.json"), "--type", "Nonsense"]);
    assert_eq!(exit_code, 2);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 2);
    assert_eq!(json["error"]["details"]["type"], "Nonsense");
}

#[test]
fn missing_file_returns_exit_3() {
    let (stdout, _stderr, exit_code) = run_tugast(&["stats", "/no/such/tree.json"]);
    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["code"], 3);
}

#[test]
fn malformed_json_returns_exit_3_with_position() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"type\": \"Program\",\n \"body\": [}").unwrap();
    let (stdout, _stderr, exit_code) = run_tugast(&["stats", &path.display().to_string()]);
    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["details"]["line"], 2);
}

#[test]
fn debug_logging_goes_to_stderr() {
    let (stdout, stderr, exit_code) = run_tugast(&[
        "stats",
        &fixture("mixed.json"),
        "--log-level",
        "debug",
    ]);
    assert_eq!(exit_code, 0);
    assert!(serde_json::from_str::<Value>(&stdout).is_ok());
    assert!(stderr.contains("loaded tree"), "{stderr}");
}

#[test]
fn json_logs_are_one_object_per_line() {
    let (_stdout, stderr, exit_code) = run_tugast(&[
        "stats",
        &fixture("mixed.json"),
        "--log-level",
        "debug",
        "--log-json",
    ]);
    assert_eq!(exit_code, 0);
    let first = stderr.lines().next().expect("expected log output");
    let event: Value = serde_json::from_str(first).expect("log line should be JSON");
    assert!(event.get("fields").is_some());
}
