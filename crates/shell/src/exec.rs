// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process runner.
//!
//! Spawns a program directly (no intermediate shell), feeds optional stdin,
//! reads stdout and stderr on two concurrent tasks, and bounds the whole run
//! with a timeout. Each child leads its own process group so a timeout can
//! kill everything it started.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::ProcessError;

/// Everything needed to start one child process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            stdin: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured output of a finished child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status, or -1 when the child was terminated by a signal.
    pub exit_code: i32,
    pub duration: Duration,
    /// Stdout or stderr held bytes that were not UTF-8; they were replaced
    /// with U+FFFD.
    pub invalid_utf8: bool,
}

/// Run a child process to completion.
pub async fn run(spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
    let span = tracing::debug_span!(
        "shell.process",
        program = %spec.program,
        exit_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    );
    run_in_span(spec, &span).instrument(span.clone()).await
}

async fn run_in_span(
    spec: &ProcessSpec,
    span: &tracing::Span,
) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();

    let mut process = tokio::process::Command::new(&spec.program);
    process
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .process_group(0);

    let mut child = process
        .spawn()
        .map_err(|source| ProcessError::Spawn { program: spec.program.clone(), source })?;
    let pid = child.id();

    let stdout_task = spawn_reader(child.stdout.take());
    let stderr_task = spawn_reader(child.stderr.take());

    if let (Some(mut pipe), Some(data)) = (child.stdin.take(), spec.stdin.clone()) {
        tokio::spawn(async move {
            // Children may exit without reading their input
            if let Err(e) = pipe.write_all(&data).await {
                tracing::trace!(error = %e, "stdin write ended early");
            }
            drop(pipe); // close pipe to signal EOF
        });
    }

    // One deadline covers the wait and the drain: a backgrounded grandchild
    // can hold the pipes open long after the direct child exits
    let stdout_abort = stdout_task.abort_handle();
    let stderr_abort = stderr_task.abort_handle();
    let program = spec.program.as_str();
    let finish = async {
        let status = child
            .wait()
            .await
            .map_err(|source| ProcessError::Io { program: program.to_string(), source })?;
        let stdout = join_reader(stdout_task, program).await?;
        let stderr = join_reader(stderr_task, program).await?;
        Ok::<_, ProcessError>((status, stdout, stderr))
    };
    let outcome = tokio::time::timeout(spec.timeout, finish).await;

    let (status, stdout, stderr) = match outcome {
        Ok(finished) => finished?,
        Err(_) => {
            kill_group(pid);
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "child already gone after group kill");
            }
            stdout_abort.abort();
            stderr_abort.abort();
            tracing::warn!(
                program = %spec.program,
                timeout_ms = spec.timeout.as_millis() as u64,
                "process timed out"
            );
            return Err(ProcessError::Timeout {
                program: spec.program.clone(),
                after: spec.timeout,
            });
        }
    };

    let duration = start.elapsed();
    let exit_code = status.code().unwrap_or(-1);

    span.record("exit_code", exit_code);
    span.record("duration_ms", duration.as_millis() as u64);

    let (stdout, stdout_lossy) = decode(stdout);
    let (stderr, stderr_lossy) = decode(stderr);
    if stdout_lossy || stderr_lossy {
        tracing::debug!(program = %spec.program, "replaced invalid UTF-8 in output");
    }

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code,
        duration,
        invalid_utf8: stdout_lossy || stderr_lossy,
    })
}

/// Decode captured bytes, reporting whether anything had to be replaced.
fn decode(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_reader(
    task: JoinHandle<std::io::Result<Vec<u8>>>,
    program: &str,
) -> Result<Vec<u8>, ProcessError> {
    let io = |source: std::io::Error| ProcessError::Io { program: program.to_string(), source };
    match task.await {
        Ok(result) => result.map_err(io),
        Err(e) => Err(io(std::io::Error::other(e))),
    }
}

/// SIGKILL the child's whole process group.
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::debug!(pid, error = %e, "killpg failed");
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
