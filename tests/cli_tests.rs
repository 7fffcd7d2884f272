//! Integration tests for the weatherbot binary

use std::io::Write;
use std::process::Command;

fn weatherbot() -> Command {
    Command::new(env!("CARGO_BIN_EXE_weatherbot"))
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_help() {
    let output = weatherbot()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("weatherbot"));
    assert!(stdout.contains("--debug"));
    assert!(stdout.contains("--config"));
}

/// Test that an invalid configuration is reported and stops startup
#[test]
fn test_invalid_config_fails_startup() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logging]\nlevel = \"chatty\"").unwrap();

    let output = weatherbot()
        .arg("--config")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid log level"), "stderr: {stderr}");
}

/// Test that a mistyped `--config` path stops startup
#[test]
fn test_missing_config_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();

    let output = weatherbot()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "stderr: {stderr}");
}

/// Test that the console transport answers `help` from stdin and exits on EOF
#[test]
fn test_console_help_round_trip() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logging]\nlevel = \"error\"").unwrap();

    let mut child = weatherbot()
        .arg("--config")
        .arg(file.path())
        .env_remove("RUST_LOG")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .expect("Failed to spawn weatherbot");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"help\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Send a location in one of these formats"));
}
