//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

use anyhow::Result;

use crate::domain::BuildSpec;
use crate::domain::fingerprint::FingerprintInput;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with extra environment variables and capture its
    /// output, bounded by the runner's timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// timeout. On timeout the child is killed, never orphaned.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<Output>;

    /// Run a long operation (package installs, image builds) to completion,
    /// optionally feeding `stdin`. No timeout is applied.
    async fn run_to_completion(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<Output>;

    /// Run a program in the foreground with inherited stdio and return its
    /// exit status. SIGINT and SIGTERM are passed on to the child and the
    /// caller keeps waiting for it.
    async fn run_status(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Checks whether a listening socket could be opened, without keeping it.
#[allow(async_fn_in_trait)]
pub trait PortProbe {
    /// `true` when `host:port` can be bound right now.
    async fn is_available(&self, host: &str, port: u16) -> Result<bool>;
}

// ── Build Spec Port ───────────────────────────────────────────────────────────

/// Loads `berth.yaml`.
pub trait BuildSpecStore {
    /// Load the spec at `path`, or `None` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<Option<BuildSpec>>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Filesystem operations needed by the build stage.
pub trait ProjectFs {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Every regular file under `dir`, labelled by its path relative to `root`.
    ///
    /// Bytecode caches and VCS metadata are skipped.
    fn tree_inputs(&self, root: &Path, dir: &Path) -> Result<Vec<FingerprintInput>>;

    /// Recursively copy `from` to `to` (which must not exist).
    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()>;

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Create an empty staging directory next to `out`.
    ///
    /// Returns `(path, guard)`; dropping `guard` removes whatever is still at
    /// `path`.
    fn create_staging(&self, out: &Path) -> Result<(PathBuf, Box<dyn Any>)>;

    /// Atomically move a finished staging directory to `out`.
    fn promote(&self, staging: &Path, out: &Path) -> Result<()>;
}
