// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fully rendered command, ready for a backend.

use sha2::{Digest, Sha256};

/// Program + argv + the shell-quoted rendering of both.
///
/// Local backends spawn `program` with `args` directly; remote backends send
/// `rendered` to the remote shell. Both forms come from the same Command, so
/// they always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    rendered: String,
    stdin: Option<Vec<u8>>,
}

impl Invocation {
    /// Build from already-validated parts. `rendered` must be the shell-quoted
    /// form of `program` and `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>, rendered: impl Into<String>) -> Self {
        Self { program: program.into(), args, rendered: rendered.into(), stdin: None }
    }

    /// Attach bytes to feed on the process's stdin.
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    /// The string that identifies this invocation in a cache key.
    ///
    /// Piped input changes the output, so a digest of stdin is appended when
    /// present.
    pub fn cache_repr(&self) -> String {
        match &self.stdin {
            Some(stdin) => format!("{} <stdin:{:x}>", self.rendered, Sha256::digest(stdin)),
            None => self.rendered.clone(),
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
