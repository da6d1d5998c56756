//! CLI integration tests

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "predict-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Tabular Predict"), "Should show app name");
    assert!(stdout.contains("schema"), "Should show schema command");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("remote"), "Should show remote command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("tabpredict"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = run_cli(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--model"), "Should show model option");
    assert!(stdout.contains("--set"), "Should show set option");
    assert!(stdout.contains("--use-defaults"), "Should show use-defaults option");
}

/// Test remote predict subcommand help
#[test]
fn test_remote_predict_help() {
    let output = run_cli(&["remote", "predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Remote predict help should succeed");
    assert!(stdout.contains("--set"), "Should show set option");
}

/// Test that the schema command lists the built-in wine features
#[test]
fn test_schema_wine_json() {
    let output = run_cli(&["--format", "json", "schema", "--app", "wine"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Schema listing should succeed");
    let rows: serde_json::Value = serde_json::from_str(&stdout).expect("JSON output");
    let rows = rows.as_array().expect("array of slots");
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["name"], "alcohol");
    assert_eq!(rows[5]["name"], "proline");
}

/// Test that an unknown app is rejected
#[test]
fn test_unknown_app_rejected() {
    let output = run_cli(&["schema", "--app", "iris"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unknown app should fail");
    assert!(stderr.contains("iris"), "Should name the bad value");
}

/// Test that a malformed --set argument is rejected
#[test]
fn test_malformed_assignment_rejected() {
    let output = run_cli(&["predict", "--app", "house", "--set", "GrLivArea"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Malformed --set should fail");
    assert!(stderr.contains("NAME=VALUE"), "Should explain the expected form");
}

/// Test that a missing model reports how to fix it
#[test]
fn test_missing_model_shows_hint() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("house_price_model.onnx");
    let output = run_cli(&[
        "predict",
        "--app",
        "house",
        "--model",
        model.to_str().unwrap(),
        "--use-defaults",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing model should fail");
    assert!(stderr.contains("Train the model first"), "Should show remediation");
}
