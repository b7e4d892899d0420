// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process execution errors.

use std::time::Duration;

/// Errors that can occur while running a child process.
///
/// A nonzero exit is not an error: it is reported through
/// [`ProcessOutput::exit_code`](crate::ProcessOutput::exit_code).
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Command not found or could not be spawned.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn { program: String, source: std::io::Error },

    /// Reading output or waiting for the child failed.
    #[error("i/o error running `{program}`: {source}")]
    Io { program: String, source: std::io::Error },

    /// The child outlived its timeout and its process group was killed.
    #[error("`{program}` timed out after {}ms", after.as_millis())]
    Timeout { program: String, after: Duration },
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
