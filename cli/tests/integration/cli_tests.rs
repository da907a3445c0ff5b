//! Integration tests for the CLI skeleton: help, version, and usage errors.

use predicates::prelude::*;

use crate::berth;

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    berth()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_commands() {
    let assert = berth().arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for cmd in ["build", "assemble", "render", "check", "config", "launch", "serve", "version"] {
        assert!(out.contains(cmd), "help is missing {cmd}:\n{out}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    berth()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_human_and_json() {
    berth()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("berth {}\n", env!("CARGO_PKG_VERSION")));

    let assert = berth().args(["version", "--json"]).assert().success();
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_no_color_env_accepts_conventional_values() {
    for value in ["1", "true", "yes", "", "0"] {
        berth()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(format!("berth {}\n", env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_no_color_env_does_not_block_commands() {
    let project = crate::project();
    berth()
        .env("NO_COLOR", "1")
        .args(["config", "--project-dir"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("8000 (default)"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    berth().arg("deploy").assert().code(2);
}

#[test]
fn test_invalid_profile_value_is_usage_error() {
    berth()
        .args(["render", "--profile", "poetry"])
        .assert()
        .code(2);
}
