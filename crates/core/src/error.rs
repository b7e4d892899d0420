// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every crate.
//!
//! Only [`InvocationError`] is ever returned to a caller as an `Err`: it is
//! raised while building an invocation, before any I/O happens. Everything
//! that goes wrong at execution time is captured into a `CommandResult` as an
//! [`ExecutionFailure`], and [`ParseError`]s are downgraded to warnings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A malformed command, detected before anything is executed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("command has an empty tool name")]
    EmptyTool,

    #[error("options `{first}` and `{second}` of `{tool}` are mutually exclusive")]
    ConflictingOptions { tool: String, first: String, second: String },

    #[error("option `{flag}` of `{tool}` requires a value")]
    MissingValue { tool: String, flag: String },

    #[error("invalid argument {arg:?}: {reason}")]
    InvalidArgument { arg: String, reason: String },

    #[error("working directory must be absolute: {}", path.display())]
    RelativeWorkingDir { path: PathBuf },

    #[error("cannot resolve working directory {}: {message}", path.display())]
    WorkingDirectory { path: PathBuf, message: String },
}

/// Output did not match the shape the dispatched adapter expects.
///
/// Always recovered: the result keeps its raw stdout, structured data stays
/// empty, and the message lands in `metadata.warnings`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("missing header: expected {expected:?}")]
    MissingHeader { expected: String },
}

impl ParseError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed { line, reason: reason.into() }
    }
}

/// Which execution-time failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Process or channel failure distinct from a clean nonzero exit.
    Execution,
    /// Remote target unreachable or authentication failed after all retries.
    Connection,
    /// Execution exceeded `context.timeout`.
    Timeout,
}

crate::simple_display! {
    FailureKind {
        Execution => "execution error",
        Connection => "connection error",
        Timeout => "timeout",
    }
}

/// Execution-time failure captured into a result instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Errors loading a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}
