// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context snapshot.
//!
//! A `CommandContext` is an immutable value: chain steps derive modified
//! copies through the `with_*` methods, they never mutate a shared instance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::InvocationError;
use crate::target::{BackendKind, RemoteHost};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
    remote: Option<RemoteHost>,
    timeout: Option<Duration>,
    privileged: bool,
    dry_run: bool,
}

impl CommandContext {
    /// Local context rooted at `dir`. Relative paths resolve against the
    /// process's current directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, InvocationError> {
        Ok(Self::at(absolute(dir.as_ref())?))
    }

    /// Local context rooted at the process's current directory.
    pub fn current() -> Result<Self, InvocationError> {
        let dir = std::env::current_dir().map_err(|e| InvocationError::WorkingDirectory {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(Self::at(dir))
    }

    /// Remote context. Remote paths cannot be resolved locally, so `dir`
    /// must already be absolute.
    pub fn remote(host: RemoteHost, dir: impl Into<PathBuf>) -> Result<Self, InvocationError> {
        let dir = dir.into();
        if !dir.is_absolute() {
            return Err(InvocationError::RelativeWorkingDir { path: dir });
        }
        let mut ctx = Self::at(dir);
        ctx.remote = Some(host);
        Ok(ctx)
    }

    fn at(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            env: BTreeMap::new(),
            remote: None,
            timeout: None,
            privileged: false,
            dry_run: false,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn remote_host(&self) -> Option<&RemoteHost> {
        self.remote.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Remote when a remote host is present, local otherwise.
    pub fn backend_kind(&self) -> BackendKind {
        match self.remote {
            Some(_) => BackendKind::Remote,
            None => BackendKind::Local,
        }
    }

    /// Stable name of the execution target, used to key per-target state.
    pub fn target(&self) -> String {
        match &self.remote {
            Some(host) => host.key().to_string(),
            None => "local".to_string(),
        }
    }

    crate::setters! {
        set {
            with_privileged => privileged: bool,
            with_dry_run => dry_run: bool,
        }
        option {
            with_timeout => timeout: Duration,
            with_remote => remote: RemoteHost,
        }
    }

    #[must_use]
    pub fn with_env(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.env.insert(key.into(), value.into());
        next
    }

    #[must_use]
    pub fn without_env(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.env.remove(key);
        next
    }

    /// Drop the remote host so the context executes locally.
    #[must_use]
    pub fn local(&self) -> Self {
        let mut next = self.clone();
        next.remote = None;
        next
    }

    /// Derive a context in another directory. Relative paths resolve against
    /// this context's working directory.
    #[must_use]
    pub fn with_working_dir(&self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut next = self.clone();
        next.working_dir =
            if dir.is_absolute() { dir.to_path_buf() } else { self.working_dir.join(dir) };
        next
    }

    /// Timeout for one backend execution: the context's own or `default`.
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    /// Digest of the fields that can change a command's output: working
    /// directory, environment, remote target and privilege.
    ///
    /// The timeout and dry-run flag do not affect what a completed command
    /// prints, so they are excluded.
    pub fn digest(&self) -> String {
        #[derive(Serialize)]
        struct DigestFields<'a> {
            working_dir: &'a Path,
            env: &'a BTreeMap<String, String>,
            remote: Option<crate::target::SessionKey>,
            privileged: bool,
        }

        let fields = DigestFields {
            working_dir: &self.working_dir,
            env: &self.env,
            remote: self.remote.as_ref().map(RemoteHost::key),
            privileged: self.privileged,
        };
        // Serializing plain strings and maps cannot fail; an empty string
        // still yields a deterministic digest.
        let canonical = serde_json::to_string(&fields).unwrap_or_default();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}

fn absolute(dir: &Path) -> Result<PathBuf, InvocationError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    std::path::absolute(dir).map_err(|e| InvocationError::WorkingDirectory {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
