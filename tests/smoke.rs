//! Smoke tests -- verify the binary parses arguments and rejects bad input
//! before touching the terminal.

use assert_cmd::Command;
use predicates::prelude::*;

fn gitter() -> Command {
    let mut cmd = Command::cargo_bin("gitter").unwrap();
    cmd.env_remove("GITTER_CONFIG");
    cmd
}

#[test]
fn test_cli_help() {
    gitter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Monitor git server stability"));
}

#[test]
fn test_cli_version() {
    gitter()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gitter"));
}

#[test]
fn test_version_subcommand() {
    gitter()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("gitter "));
}

#[test]
fn test_clone_help_lists_flags() {
    gitter()
        .args(["clone", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--error-history"))
        .stdout(predicate::str::contains("--demo"));
}

#[test]
fn test_demo_subcommand_exists() {
    gitter().args(["demo", "--help"]).assert().success();
}

#[test]
fn test_clone_without_url_fails() {
    gitter()
        .arg("clone")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: repository URL is required when not in demo mode",
        ));
}

#[test]
fn test_zero_interval_rejected() {
    gitter()
        .args(["clone", "https://github.com/user/repo.git", "-i", "0s"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: interval must be positive"));
}

#[test]
fn test_zero_timeout_rejected() {
    gitter()
        .args(["demo", "--timeout", "0s"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: timeout must be positive"));
}

#[test]
fn test_narrow_width_rejected() {
    gitter()
        .args(["clone", "https://github.com/user/repo.git", "-w", "30"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: width must be between 50 and 300, got 30",
        ));
}

#[test]
fn test_zero_error_history_rejected() {
    gitter()
        .args(["demo", "-e", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: error-history must be positive",
        ));
}

#[test]
fn test_unparseable_interval_rejected_by_parser() {
    gitter()
        .args(["demo", "--interval", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval"));
}

#[test]
fn test_settings_file_values_are_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gitter.toml");
    std::fs::write(&path, "width = 400\n").unwrap();

    gitter()
        .arg("--config")
        .arg(&path)
        .arg("demo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("got 400"));
}

#[test]
fn test_missing_settings_file_fails() {
    gitter()
        .args(["--config", "/nonexistent/gitter.toml", "demo"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read config file"));
}
