// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable command results.
//!
//! A [`CommandResult`] is created once through [`ResultBuilder`] and is
//! read-only afterwards. The builder enforces the success invariant: a
//! nonzero exit code or a captured execution failure always yields
//! `success == false`, and exit code 0 yields `success == true` unless the
//! result was explicitly downgraded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionFailure, FailureKind};
use crate::record::Record;
use crate::target::BackendKind;
use crate::version::VersionInfo;

/// Exit code recorded when no process exit status exists.
pub const NO_EXIT_CODE: i32 = -1;

/// How a tool's exit code was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitClass {
    #[default]
    Success,
    /// Nonzero, but declared by the tool as an ordinary outcome (e.g. `ls`
    /// exit 1 for "minor problems"). Still `success == false`.
    Expected,
    Failed,
}

crate::simple_display! {
    ExitClass {
        Success => "success",
        Expected => "expected",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub invocation: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub backend: BackendKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionInfo>,
    #[serde(default)]
    pub exit_class: ExitClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    stdout: String,
    stderr: String,
    exit_code: i32,
    success: bool,
    structured: Vec<Record>,
    metadata: ResultMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<CommandResult>,
}

impl CommandResult {
    pub fn builder(invocation: impl Into<String>, backend: BackendKind) -> ResultBuilder {
        ResultBuilder::new(invocation, backend)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn structured_data(&self) -> &[Record] {
        &self.structured
    }

    pub fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    pub fn warnings(&self) -> &[String] {
        &self.metadata.warnings
    }

    pub fn failure(&self) -> Option<&ExecutionFailure> {
        self.metadata.failure.as_ref()
    }

    /// True when the backend reported a timeout for this execution.
    pub fn timed_out(&self) -> bool {
        self.failure().is_some_and(|f| f.kind == FailureKind::Timeout)
    }

    /// Upstream results this one was chained from, in execution order.
    pub fn history(&self) -> &[CommandResult] {
        &self.history
    }
}

/// One-shot constructor for [`CommandResult`].
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    stdout: String,
    stderr: String,
    exit_code: i32,
    structured: Vec<Record>,
    failed: bool,
    history: Vec<CommandResult>,
    metadata: ResultMetadata,
    exit_class: Option<ExitClass>,
}

impl ResultBuilder {
    fn new(invocation: impl Into<String>, backend: BackendKind) -> Self {
        let now = Utc::now();
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            structured: Vec::new(),
            failed: false,
            history: Vec::new(),
            exit_class: None,
            metadata: ResultMetadata {
                invocation: invocation.into(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
                backend,
                warnings: Vec::new(),
                failure: None,
                version: None,
                exit_class: ExitClass::Success,
            },
        }
    }

    pub fn stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn structured(mut self, records: Vec<Record>) -> Self {
        self.structured = records;
        self
    }

    pub fn timing(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        self.metadata.started_at = started_at;
        self.metadata.finished_at = finished_at;
        self.metadata.duration_ms =
            u64::try_from((finished_at - started_at).num_milliseconds()).unwrap_or(0);
        self
    }

    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.metadata.warnings.push(warning.into());
        self
    }

    pub fn warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.metadata.warnings.extend(warnings);
        self
    }

    /// Capture an execution-time failure. The result will not be successful.
    pub fn failure(mut self, failure: ExecutionFailure) -> Self {
        self.metadata.warnings.push(failure.to_string());
        self.metadata.failure = Some(failure);
        if self.exit_code == 0 {
            self.exit_code = NO_EXIT_CODE;
        }
        self
    }

    /// Mark the result failed even though the exit code may be 0.
    ///
    /// Used by parsers that detect a semantic failure (an error banner
    /// printed with exit 0) and by chains aggregating a failed step.
    pub fn downgrade(mut self, reason: impl Into<String>) -> Self {
        self.metadata.warnings.push(reason.into());
        self.failed = true;
        self
    }

    /// Mark failed without adding a warning (the reason is already recorded).
    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    pub fn version(mut self, version: VersionInfo) -> Self {
        self.metadata.version = Some(version);
        self
    }

    pub fn exit_class(mut self, class: ExitClass) -> Self {
        self.exit_class = Some(class);
        self
    }

    pub fn history(mut self, history: Vec<CommandResult>) -> Self {
        self.history = history;
        self
    }

    pub fn build(self) -> CommandResult {
        let Self {
            stdout, stderr, exit_code, structured, failed, history, mut metadata, exit_class,
        } = self;
        let success = exit_code == 0 && metadata.failure.is_none() && !failed;
        metadata.exit_class = match exit_class {
            Some(class) if exit_code != 0 && class == ExitClass::Success => ExitClass::Failed,
            Some(class) => class,
            None if exit_code == 0 => ExitClass::Success,
            None => ExitClass::Failed,
        };
        CommandResult { stdout, stderr, exit_code, success, structured, metadata, history }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
