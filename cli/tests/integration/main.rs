//! Integration tests for the berth CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! They are slower and should be run separately from unit tests.

#![allow(clippy::expect_used)]

mod cli_tests;
mod launch_command;

use std::path::Path;

use assert_cmd::Command;

/// The binary with a clean, colorless environment.
pub fn berth() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("berth"));
    cmd.env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn");
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write fixture");
}

/// A requirements-profile project with source tree and graph manifest.
pub fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "requirements.txt", "fastapi\nuvicorn\nlanggraph>=0.2\n");
    write(dir.path(), "src/yield_agent/__init__.py", "");
    write(dir.path(), "src/yield_agent/server.py", "app = object()\n");
    write(dir.path(), "src/yield_agent/graph.py", "graph = object()\n");
    write(
        dir.path(),
        "langgraph.json",
        r#"{"dependencies": ["."], "graphs": {"yield_agent": "./src/yield_agent/graph.py:graph"}}"#,
    );
    dir
}
