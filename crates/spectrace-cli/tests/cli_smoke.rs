use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

const TRACE: &str = "\
metadata:
  fork: phase0
  preset: minimal
trace:
- op: spec_call
  method: get_current_epoch
  assert_output: 0
- op: spec_call
  method: fail_op
  error:
    type: AssertionError
    message: boom
";

const MANIFEST: &str = r#"{
  "artifacts": [],
  "created_at": "2024-01-01T00:00:00+00:00",
  "schema_version": { "major": 1, "minor": 0, "patch": 0 }
}"#;

fn write_trace(dir: &Path) {
    fs::write(dir.join("trace.yaml"), TRACE).unwrap();
    fs::write(dir.join("manifest.json"), MANIFEST).unwrap();
}

fn spectrace(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_spectrace"))
        .args(args)
        .output()
        .expect("run spectrace")
}

#[test]
fn inspect_emits_json_summary() {
    let dir = tempdir().unwrap();
    write_trace(dir.path());
    let path = dir.path().to_str().unwrap();

    let output = spectrace(&["inspect", "--trace", path, "--json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["fork"], "phase0");
    assert_eq!(summary["steps"]["spec_call"], 2);
    assert_eq!(summary["errors"][0][1]["type"], "AssertionError");
    assert!(summary["final_state_root"].is_null());
}

#[test]
fn verify_succeeds_on_consistent_trace() {
    let dir = tempdir().unwrap();
    write_trace(dir.path());
    let output = spectrace(&["verify", "--trace", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("trace verified: 2 steps"));
}

#[test]
fn verify_fails_without_trace_document() {
    let dir = tempdir().unwrap();
    let output = spectrace(&["verify", "--trace", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());
}
