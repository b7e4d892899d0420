// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution backend seam.

use std::time::Duration;

use async_trait::async_trait;
use cmdx_core::{BackendKind, CommandContext, ExecutionFailure, FailureKind, Invocation};
use thiserror::Error;

/// Raw output of one backend execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    /// Undecodable bytes were replaced while capturing the streams.
    pub invalid_utf8: bool,
}

impl RawOutput {
    pub fn new(stdout: impl Into<String>, exit_code: i32) -> Self {
        Self { stdout: stdout.into(), exit_code, ..Self::default() }
    }

    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

impl From<cmdx_shell::ProcessOutput> for RawOutput {
    fn from(out: cmdx_shell::ProcessOutput) -> Self {
        Self {
            stdout: out.stdout,
            stderr: out.stderr,
            exit_code: out.exit_code,
            duration: out.duration,
            invalid_utf8: out.invalid_utf8,
        }
    }
}

/// Errors from backend operations.
///
/// Never surfaced to callers of `Command::execute`: the engine captures them
/// into the result as an [`ExecutionFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{0}")]
    Execution(String),

    #[error("{target}: {message} (after {attempts} attempt(s))")]
    Connection { target: String, attempts: u32, message: String },

    #[error("timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },
}

impl BackendError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BackendError::Execution(_) => FailureKind::Execution,
            BackendError::Connection { .. } => FailureKind::Connection,
            BackendError::Timeout { .. } => FailureKind::Timeout,
        }
    }

    pub fn to_failure(&self) -> ExecutionFailure {
        ExecutionFailure::new(self.failure_kind(), self.to_string())
    }
}

impl From<cmdx_shell::ProcessError> for BackendError {
    fn from(e: cmdx_shell::ProcessError) -> Self {
        match e {
            cmdx_shell::ProcessError::Timeout { after, .. } => BackendError::Timeout { after },
            other => BackendError::Execution(other.to_string()),
        }
    }
}

/// Executes a built invocation somewhere.
///
/// Implementations must honour the context's working directory,
/// environment, privilege flag and timeout, and must pipe
/// [`Invocation::stdin`] to the process when present.
#[async_trait]
pub trait ExecutionBackend: Send + Sync + 'static {
    fn kind(&self) -> BackendKind;

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
    ) -> Result<RawOutput, BackendError>;

    /// Release pooled resources. The backend may not be used afterwards.
    async fn shutdown(&self) {}
}
