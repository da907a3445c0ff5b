//! Infrastructure implementation of the `CommandRunner` port.
//!
//! Short probes are bounded by a timeout and killed when it fires. Package
//! installs and image builds run unbounded. The foreground server inherits
//! the terminal.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::application::ports::CommandRunner;

/// Default timeout for short probes (`python -c`, `docker version`).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokio-backed `CommandRunner`.
///
/// Timeouts race `tokio::select!` against the child and kill it explicitly;
/// dropping a `timeout` future alone would leave the process running on
/// Windows.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

fn piped(program: &str, args: &[&str], env: &[(String, String)], stdin: bool) -> Result<Child> {
    Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(if stdin { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

async fn read_all<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = h.read_to_end(&mut buf).await;
    }
    buf
}

/// Feed stdin, drain stdout/stderr concurrently, and wait for exit.
async fn collect(program: &str, child: &mut Child, input: Option<&[u8]>) -> Result<Output> {
    let stdin_handle = child.stdin.take();
    let input_owned = input.map(<[u8]>::to_vec);
    let stdin_task = tokio::spawn(async move {
        if let (Some(mut stdin), Some(bytes)) = (stdin_handle, input_owned) {
            let _ = stdin.write_all(&bytes).await;
        }
    });

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let (status, stdout, stderr) = tokio::join!(
        child.wait(),
        read_all(stdout_handle),
        read_all(stderr_handle),
    );
    let _ = stdin_task.await;
    Ok(Output {
        status: status.with_context(|| format!("waiting for {program}"))?,
        stdout,
        stderr,
    })
}

impl CommandRunner for TokioCommandRunner {
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<Output> {
        let mut child = piped(program, args, env, false)?;
        tokio::select! {
            result = collect(program, &mut child, None) => result,
            () = tokio::time::sleep(self.timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", self.timeout.as_secs())
            }
        }
    }

    async fn run_to_completion(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<Output> {
        let mut child = piped(program, args, &[], stdin.is_some())?;
        collect(program, &mut child, stdin).await
    }

    async fn run_status(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<ExitStatus> {
        let mut command = Command::new(program);
        command
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true);
        wait_forwarding_signals(program, &mut command).await
    }
}

/// Spawn `command` in its own process group and wait for it, passing each
/// SIGINT and SIGTERM this process receives on to the child exactly once.
#[cfg(unix)]
async fn wait_forwarding_signals(program: &str, command: &mut Command) -> Result<ExitStatus> {
    use tokio::signal::unix::{SignalKind, signal};

    // Handlers go in before the child exists so no signal is lost between.
    let mut interrupt = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut child = command
        .process_group(0)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    loop {
        let sig = tokio::select! {
            status = child.wait() => {
                return status.with_context(|| format!("waiting for {program}"));
            }
            _ = interrupt.recv() => libc::SIGINT,
            _ = terminate.recv() => libc::SIGTERM,
        };
        match child.id() {
            Some(pid) => {
                tracing::info!(pid, signal = sig, "forwarding signal to {program}");
                if let Err(e) = send_signal(pid, sig) {
                    tracing::warn!(error = %e, "could not signal {program}");
                }
            }
            None => tracing::debug!("{program} already exited"),
        }
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn send_signal(pid: u32, sig: libc::c_int) -> Result<()> {
    let pid = libc::pid_t::try_from(pid).context("process id out of range")?;
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(pid, sig) } != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("kill({pid}, {sig}) failed"));
    }
    Ok(())
}

/// The console delivers Ctrl-C to the child as well; keep waiting so the
/// child's own exit status is what we report.
#[cfg(not(unix))]
async fn wait_forwarding_signals(program: &str, command: &mut Command) -> Result<ExitStatus> {
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    loop {
        tokio::select! {
            status = child.wait() => {
                return status.with_context(|| format!("waiting for {program}"));
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("installing Ctrl-C handler")?;
                tracing::info!("interrupt received, waiting for {program} to exit");
            }
        }
    }
}
