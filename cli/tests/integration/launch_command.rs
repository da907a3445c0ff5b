//! Integration tests for `berth launch`.

use predicates::prelude::*;

use crate::berth;

#[test]
fn test_launch_dry_run_prints_command() {
    berth()
        .env("PORT", "9300")
        .env("APP_SOURCE_ROOT", "/srv/app")
        .args(["launch", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PYTHONPATH=/srv/app"))
        .stdout(predicate::str::contains(
            "python -m uvicorn yield_agent.server:app --host 0.0.0.0 --port 9300",
        ));
}

#[test]
fn test_launch_dry_run_binary_entry_json() {
    let assert = berth()
        .args(["launch", "--dry-run", "--json", "--entry", "binary", "--port", "8100"])
        .assert()
        .success();
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json");
    assert_eq!(value["program"], "uvicorn");
    assert_eq!(value["args"][0], "yield_agent.server:app");
    assert_eq!(value["args"][4], "8100");
}

#[test]
fn test_launch_invalid_port_fails_before_anything_runs() {
    berth()
        .env("PORT", "0")
        .args(["launch", "--python", "definitely-not-a-python"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid PORT '0'"));
}

#[test]
fn test_launch_invalid_app_identifier() {
    berth()
        .args(["launch", "--dry-run", "--app", "not a module"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid application identifier"));
}

#[cfg(unix)]
#[test]
fn test_launch_unresolvable_app_exits_non_zero() {
    // `false` exits 1 without output, so the import check fails.
    berth()
        .args(["launch", "--python", "false", "--port", "9301"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot resolve application"));
}

#[cfg(unix)]
#[test]
fn test_launch_propagates_server_exit_code() {
    // Without preflight the interpreter is the server; `false` exits 1.
    berth()
        .args(["launch", "--no-preflight", "--python", "false"])
        .assert()
        .code(1);
    berth()
        .args(["launch", "--no-preflight", "--python", "true"])
        .assert()
        .success();
}
