// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend selection by context.

use std::sync::Arc;

use async_trait::async_trait;
use cmdx_core::{BackendKind, CommandContext, Invocation};

use crate::backend::{BackendError, ExecutionBackend, RawOutput};

/// One implementation per [`BackendKind`]. A context with a remote host
/// selects the remote backend, anything else runs locally.
///
/// The registry is itself an [`ExecutionBackend`] that dispatches per call.
#[derive(Clone)]
pub struct BackendRegistry {
    local: Arc<dyn ExecutionBackend>,
    remote: Arc<dyn ExecutionBackend>,
}

impl BackendRegistry {
    pub fn new(local: Arc<dyn ExecutionBackend>, remote: Arc<dyn ExecutionBackend>) -> Self {
        Self { local, remote }
    }

    /// Replace the implementation registered for `kind`.
    #[must_use]
    pub fn register(mut self, kind: BackendKind, backend: Arc<dyn ExecutionBackend>) -> Self {
        match kind {
            BackendKind::Local => self.local = backend,
            BackendKind::Remote => self.remote = backend,
        }
        self
    }

    pub fn get(&self, kind: BackendKind) -> &Arc<dyn ExecutionBackend> {
        match kind {
            BackendKind::Local => &self.local,
            BackendKind::Remote => &self.remote,
        }
    }

    pub fn select(&self, ctx: &CommandContext) -> &Arc<dyn ExecutionBackend> {
        self.get(ctx.backend_kind())
    }
}

#[async_trait]
impl ExecutionBackend for BackendRegistry {
    /// The kind is decided per call; the registry reports local by default.
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
    ) -> Result<RawOutput, BackendError> {
        self.select(ctx).execute(invocation, ctx).await
    }

    async fn shutdown(&self) {
        self.local.shutdown().await;
        self.remote.shutdown().await;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
