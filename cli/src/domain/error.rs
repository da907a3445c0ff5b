//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use berth_common::env::{InvalidPort, NotUnicode};
use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving runtime configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT '{value}': {reason}")]
    InvalidPort { value: String, reason: &'static str },

    #[error("Invalid application identifier '{value}': {reason}")]
    InvalidAppIdentifier { value: String, reason: String },

    #[error("Cannot read environment: {0}")]
    Environment(String),
}

impl From<InvalidPort> for ConfigError {
    fn from(e: InvalidPort) -> Self {
        Self::InvalidPort {
            value: e.value,
            reason: e.reason,
        }
    }
}

impl From<NotUnicode> for ConfigError {
    fn from(e: NotUnicode) -> Self {
        Self::Environment(e.to_string())
    }
}

// ── Build errors ──────────────────────────────────────────────────────────────

/// Errors raised while preparing or running the build stage.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dependency manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error(
        "No dependency manifest in {}. Add requirements.txt or pyproject.toml, or write a berth.yaml.",
        .0.display()
    )]
    NoManifest(PathBuf),

    #[error(
        "Both requirements.txt and pyproject.toml exist in {}. Pick one with --profile requirements|project.",
        .0.display()
    )]
    AmbiguousProfile(PathBuf),

    #[error("--profile {requested} conflicts with berth.yaml, which declares '{declared}'")]
    ProfileConflict {
        requested: &'static str,
        declared: &'static str,
    },

    #[error("Invalid requirement on line {line_no}: '{line}' ({reason})")]
    InvalidRequirement {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("Line {line_no}: '{directive}' includes are not followed; inline the requirements")]
    UnsupportedDirective { line_no: usize, directive: String },

    #[error("Invalid project metadata: {0}")]
    InvalidProject(String),

    #[error("Invalid build spec:\n{0}")]
    InvalidSpec(String),

    #[error("{program} failed{}{}", exit_suffix(.code), stderr_suffix(.stderr))]
    InstallFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Output directory already exists: {}", .0.display())]
    OutputExists(PathBuf),
}

#[allow(clippy::ref_option)] // called with a field reference by thiserror
fn exit_suffix(code: &Option<i32>) -> String {
    code.map_or_else(|| " (terminated by signal)".to_string(), |c| format!(" with exit code {c}"))
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

// ── Launch errors ─────────────────────────────────────────────────────────────

/// Errors raised while starting the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Cannot resolve application '{app}': {detail}")]
    AppResolution { app: String, detail: String },

    #[error("Unknown application '{app}'. Built-in applications: {available}")]
    UnknownApplication { app: String, available: String },

    #[error("Port {port} on {host} is already in use")]
    PortInUse { host: String, port: u16 },
}

// ── Lifecycle errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

// ── Graph manifest errors ─────────────────────────────────────────────────────

/// Errors raised while reading the graph manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphManifestError {
    #[error("Cannot parse graph manifest: {0}")]
    Parse(String),

    #[error("Graph manifest declares no graphs")]
    NoGraphs,

    #[error("Graph '{graph}' has malformed reference '{reference}': expected path/to/file.py:object")]
    BadReference { graph: String, reference: String },
}
