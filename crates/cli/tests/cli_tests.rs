//! CLI integration tests

use std::io::Write;
use std::process::Command;

fn run_ssp(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-p", "ssp-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_ssp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Sidecar Spec Provisioner"),
        "Should show app name"
    );
    assert!(stdout.contains("resources"), "Should show resources command");
    assert!(stdout.contains("probes"), "Should show probes command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_ssp(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("ssp"), "Should show binary name");
}

/// Test resources subcommand help
#[test]
fn test_resources_help() {
    let output = run_ssp(&["resources", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Resources help should succeed");
    assert!(stdout.contains("--spec"), "Should show spec option");
}

/// Test probes subcommand help
#[test]
fn test_probes_help() {
    let output = run_ssp(&["probes", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Probes help should succeed");
    assert!(stdout.contains("--spec"), "Should show spec option");
}

/// Test format option
#[test]
fn test_format_option() {
    let output = run_ssp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
}

/// Test config option with env fallback
#[test]
fn test_config_option() {
    let output = run_ssp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--config"), "Should show config option");
    assert!(stdout.contains("SSP_CONFIG"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = run_ssp(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = run_ssp(&["resources"]);
    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

fn workload_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"{{
            "resources": {{
                "requests": {{"cpu": "1000m"}}
            }},
            "readinessProbe": {{
                "httpGet": {{"path": "/healthz", "port": 8080}},
                "initialDelaySeconds": 3
            }},
            "annotations": {{
                "sidecar.provisioner.dev/resource-percentage": "10"
            }}
        }}"#
    )
    .expect("Failed to write workload spec");
    file
}

/// Derive resources from a real workload spec file
#[test]
fn test_resources_json_derivation() {
    let file = workload_file();
    let output = run_ssp(&[
        "--format",
        "json",
        "resources",
        "--spec",
        file.path().to_str().unwrap(),
    ]);

    assert!(output.status.success(), "Resources derivation should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("\"cpu\": \"100m\""),
        "10% of 1000m should be 100m, got: {}",
        stdout
    );
    assert!(
        !stdout.contains("\"limits\""),
        "No limits should be asserted"
    );
}

/// Derive probes from a real workload spec file
#[test]
fn test_probes_json_derivation() {
    let file = workload_file();
    let output = run_ssp(&[
        "--format",
        "json",
        "probes",
        "--spec",
        file.path().to_str().unwrap(),
    ]);

    assert!(output.status.success(), "Probes derivation should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("startupProbe"), "Should include startup probe");
    assert!(
        stdout.contains("readinessProbe"),
        "Should include readiness probe"
    );
    assert!(
        stdout.contains("probePayload"),
        "Should include the encoded payload"
    );
    assert!(stdout.contains("httpGet"), "Readiness should be an HTTP check");
}

/// A nonexistent spec file is a clean error
#[test]
fn test_missing_spec_file() {
    let output = run_ssp(&["resources", "--spec", "/nonexistent/workload.json"]);
    assert!(!output.status.success(), "Missing spec file should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read workload spec"),
        "Should show read error"
    );
}
