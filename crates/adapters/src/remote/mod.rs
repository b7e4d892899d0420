// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote execution over pooled sessions.

mod pool;
mod script;
mod session;
mod ssh;

pub use pool::SessionPool;
pub use script::remote_script;
pub use session::{Connector, RemoteSession, SessionError};
pub use ssh::SshConnector;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cmdx_core::{BackendKind, CommandContext, Invocation, RemoteSettings};
use tracing::Instrument;

use crate::backend::{BackendError, ExecutionBackend, RawOutput};

/// Runs invocations on the context's remote host.
#[derive(Clone)]
pub struct RemoteBackend {
    pool: Arc<SessionPool>,
    default_timeout: Duration,
}

impl RemoteBackend {
    pub fn new(pool: Arc<SessionPool>, default_timeout: Duration) -> Self {
        Self { pool, default_timeout }
    }

    /// Backend over OpenSSH master connections.
    pub fn ssh(settings: &RemoteSettings, default_timeout: Duration) -> Self {
        let connector = Arc::new(SshConnector::new(settings));
        Self::new(Arc::new(SessionPool::new(connector, settings.clone())), default_timeout)
    }

    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }
}

#[async_trait]
impl ExecutionBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
    ) -> Result<RawOutput, BackendError> {
        let Some(host) = ctx.remote_host() else {
            return Err(BackendError::Execution("context has no remote host".to_string()));
        };
        let script = remote_script(invocation, ctx);
        let timeout = ctx.effective_timeout(self.default_timeout);
        let span = tracing::info_span!("cmdx.remote", target_host = %host.key(), cmd = %invocation);

        async {
            let start = Instant::now();
            let mut out = self.pool.run(host, &script, invocation.stdin(), timeout).await?;
            if out.duration.is_zero() {
                out.duration = start.elapsed();
            }
            tracing::debug!(
                exit_code = out.exit_code,
                elapsed_ms = out.duration.as_millis() as u64,
                "remote execution finished"
            );
            Ok(out)
        }
        .instrument(span)
        .await
    }

    async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
