// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use async_trait::async_trait;
use cmdx_core::{BackendKind, CommandContext, Invocation};
use cmdx_shell::ProcessSpec;
use tracing::Instrument;

use crate::backend::{BackendError, ExecutionBackend, RawOutput};

/// Runs invocations as local child processes.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    default_timeout: Duration,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl LocalBackend {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// The process to spawn for `invocation` under `ctx`. Privileged contexts
    /// run through non-interactive `sudo`, with the context environment passed
    /// to `env` inside it since sudo resets its own.
    pub fn process_spec(&self, invocation: &Invocation, ctx: &CommandContext) -> ProcessSpec {
        let (program, args) = if ctx.is_privileged() {
            let mut args = vec!["-n".to_string()];
            if !ctx.env().is_empty() {
                args.push("env".to_string());
                args.extend(ctx.env().iter().map(|(key, value)| format!("{key}={value}")));
            }
            args.push(invocation.program().to_string());
            args.extend(invocation.args().iter().cloned());
            ("sudo".to_string(), args)
        } else {
            (invocation.program().to_string(), invocation.args().to_vec())
        };

        let mut spec = ProcessSpec::new(program, ctx.working_dir())
            .args(args)
            .timeout(ctx.effective_timeout(self.default_timeout));
        for (key, value) in ctx.env() {
            spec = spec.env(key, value);
        }
        if let Some(stdin) = invocation.stdin() {
            spec = spec.stdin(stdin);
        }
        spec
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
    ) -> Result<RawOutput, BackendError> {
        let spec = self.process_spec(invocation, ctx);
        let span = tracing::info_span!("cmdx.exec", backend = "local", cmd = %invocation);
        async {
            let result = cmdx_shell::run(&spec).await;
            match &result {
                Ok(out) => tracing::debug!(
                    exit_code = out.exit_code,
                    elapsed_ms = out.duration.as_millis() as u64,
                    "local execution finished"
                ),
                Err(e) => tracing::warn!(error = %e, "local execution failed"),
            }
            result.map(RawOutput::from).map_err(BackendError::from)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
