use assert_cmd::prelude::*;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_cli_help_command() {
    let output = Command::cargo_bin("cdmloader")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ddl"));
    assert!(stdout.contains("vocabulary"));
    assert!(stdout.contains("truncate"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_cli_version_command() {
    let output = Command::cargo_bin("cdmloader")
        .unwrap()
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cdmloader"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_config_fails_with_hint() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("missing.toml");

    let output = Command::cargo_bin("cdmloader")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("ddl")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cdmloader init"), "{stderr}");
}

#[test]
fn test_init_command_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cdmloader.toml");

    Command::cargo_bin("cdmloader")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["init", "--database", "ohdsi"])
        .assert()
        .success();

    assert!(config_path.exists());
}
