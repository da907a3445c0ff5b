//! Shared mock infrastructure for unit tests.
//!
//! Provides a recording [`CommandRunner`], a canned [`PortProbe`], a silent
//! [`ProgressReporter`], and project fixtures so each test file doesn't have
//! to re-define the same boilerplate.

#![allow(clippy::expect_used)]

use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use anyhow::Result;
use berth_cli::application::ports::{CommandRunner, PortProbe, ProgressReporter};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Recording runner ──────────────────────────────────────────────────────────

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<Vec<u8>>,
}

/// Records every call and answers with canned results.
pub struct RecordingRunner {
    calls: Mutex<Vec<Call>>,
    /// Returned by `run`, `run_with_env`, and `run_to_completion`.
    output: Output,
    /// Returned by `run_status`.
    status: ExitStatus,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::with(ok_output(b""), ExitStatus::from_raw(0))
    }

    pub fn failing(stderr: &[u8]) -> Self {
        Self::with(err_output(stderr), ExitStatus::from_raw(1 << 8))
    }

    pub fn with(output: Output, status: ExitStatus) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            output,
            status,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, program: &str, args: &[&str], env: &[(String, String)], stdin: Option<&[u8]>) {
        self.calls.lock().expect("lock").push(Call {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            env: env.to_vec(),
            stdin: stdin.map(<[u8]>::to_vec),
        });
    }
}

impl CommandRunner for RecordingRunner {
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<Output> {
        self.record(program, args, env, None);
        Ok(self.output.clone())
    }

    async fn run_to_completion(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<Output> {
        self.record(program, args, &[], stdin);
        Ok(self.output.clone())
    }

    async fn run_status(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<ExitStatus> {
        self.record(program, args, env, None);
        Ok(self.status)
    }
}

// ── Port probe ────────────────────────────────────────────────────────────────

/// Answers every probe with the same availability.
pub struct FixedProbe(pub bool);

impl PortProbe for FixedProbe {
    async fn is_available(&self, _host: &str, _port: u16) -> Result<bool> {
        Ok(self.0)
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── Project fixtures ──────────────────────────────────────────────────────────

pub const GRAPH_MANIFEST: &str = r#"{
  "dependencies": ["."],
  "graphs": { "yield_agent": "./src/yield_agent/graph.py:graph" },
  "env": ".env"
}
"#;

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write fixture");
}

/// A project with source tree and graph manifest but no dependency manifest.
pub fn bare_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "src/yield_agent/__init__.py", "");
    write(dir.path(), "src/yield_agent/server.py", "app = object()\n");
    write(dir.path(), "src/yield_agent/graph.py", "graph = object()\n");
    write(dir.path(), "langgraph.json", GRAPH_MANIFEST);
    dir
}

/// `bare_project` plus a `requirements.txt`.
pub fn requirements_project() -> tempfile::TempDir {
    let dir = bare_project();
    write(
        dir.path(),
        "requirements.txt",
        "# runtime\nfastapi>=0.110\nuvicorn[standard]==0.29.0\nlanggraph\n",
    );
    dir
}

/// `bare_project` plus a `pyproject.toml`.
pub fn pyproject_project() -> tempfile::TempDir {
    let dir = bare_project();
    write(
        dir.path(),
        "pyproject.toml",
        "[project]\nname = \"yield-agent\"\nversion = \"1.0.0\"\ndependencies = [\"langgraph>=0.2\", \"httpx\"]\n",
    );
    dir
}
