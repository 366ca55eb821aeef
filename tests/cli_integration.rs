//! CLI integration tests
//!
//! These run the built binary. Nothing here needs a live Ollama or Chroma:
//! service URLs point at a closed local port.

use std::process::Command;

const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

fn paramforge() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_paramforge"));
    command
        .env_remove("RUST_LOG")
        .env("PARAMFORGE_OLLAMA_HOST", DEAD_ENDPOINT)
        .env("PARAMFORGE_STORE_URL", DEAD_ENDPOINT)
        .env("PARAMFORGE_CONVERSION_TIMEOUT", "2")
        .env("PARAMFORGE_GENERATION_TIMEOUT", "2");
    command
}

#[test]
fn test_help_lists_commands() {
    let output = paramforge().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["run", "generate", "convert", "health"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_version() {
    let output = paramforge().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_generate_requires_instruction() {
    let output = paramforge().arg("generate").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("INSTRUCTION"));
}

#[test]
fn test_invalid_format_rejected() {
    let output = paramforge()
        .args(["convert", "make a block", "--format", "yaml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_invalid_config_fails_fast() {
    let output = paramforge()
        .args(["health", "--results", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid configuration"));
}

#[test]
fn test_health_reports_unreachable_services() {
    let output = paramforge().arg("health").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ollama"));
    assert!(stdout.contains("chroma"));
    assert!(stdout.contains("Unavailable"));
}

#[test]
fn test_health_json() {
    let output = paramforge()
        .args(["health", "--format", "json"])
        .output()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["services"]["ollama"]["available"], false);
    assert_eq!(parsed["store_url"], DEAD_ENDPOINT);
}

#[test]
fn test_convert_against_dead_backend_fails_cleanly() {
    let output = paramforge()
        .args(["convert", "make a block 50mm long", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .contains("conversion call failed"));
}
