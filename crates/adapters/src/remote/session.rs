// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote session seam: connectors establish sessions, sessions run scripts.

use std::time::Duration;

use async_trait::async_trait;
use cmdx_core::RemoteHost;
use thiserror::Error;

use crate::backend::RawOutput;

/// Errors from connecting to or using a remote session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Could not establish a session. Retried with backoff.
    #[error("connect failed: {0}")]
    Connect(String),

    /// An established session stopped working. The pool reconnects.
    #[error("session broken: {0}")]
    Broken(String),

    /// The script outlived its timeout. Not retried.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The connector cannot use this host's auth material. Not retried.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Connect(_) | SessionError::Broken(_))
    }
}

/// Establishes sessions to remote hosts.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, host: &RemoteHost) -> Result<Box<dyn RemoteSession>, SessionError>;
}

/// A live connection that runs one script at a time.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Run `script` in the remote shell.
    async fn exec(
        &mut self,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<RawOutput, SessionError>;

    /// Cheap liveness check used before reusing a long-idle session.
    async fn probe(&mut self) -> bool;

    async fn close(&mut self);
}
