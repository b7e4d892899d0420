// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uncached command execution

use std::sync::Arc;

use async_trait::async_trait;
use cmdx_adapters::ExecutionBackend;
use cmdx_core::{CommandContext, CommandResult, InvocationError, VersionInfo};
use cmdx_storage::{AuditLog, AuditRecord};
use uuid::Uuid;

use crate::command::Command;
use crate::version::VersionService;

/// Runs one chain step. Implemented by [`Executor`] and by
/// [`CacheService`](crate::CacheService), so a chain can be cached step-wise.
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run_step(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError>;

    /// Record an executed chain step in the audit log, if there is one.
    fn record_step(&self, _run_id: Uuid, _step: usize, _result: &CommandResult, _target: &str) {}
}

/// Executes commands through a backend, resolving versions on the way.
pub struct Executor {
    backend: Arc<dyn ExecutionBackend>,
    versions: Arc<VersionService>,
    audit: Option<Arc<AuditLog>>,
}

impl Executor {
    pub fn new(backend: Arc<dyn ExecutionBackend>, versions: Arc<VersionService>) -> Self {
        Self { backend, versions, audit: None }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn backend(&self) -> &Arc<dyn ExecutionBackend> {
        &self.backend
    }

    pub fn versions(&self) -> &Arc<VersionService> {
        &self.versions
    }

    pub async fn execute(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        let result = command.execute(ctx, self.backend.as_ref(), &self.versions).await?;
        Ok(log_executed(result, ctx))
    }

    /// Execute with a version resolved earlier through
    /// [`resolve_version`](Self::resolve_version). No detection runs here.
    pub async fn execute_with_version(
        &self,
        command: &Command,
        ctx: &CommandContext,
        version: Option<VersionInfo>,
    ) -> Result<CommandResult, InvocationError> {
        let result = command.execute_with_version(ctx, self.backend.as_ref(), version).await?;
        Ok(log_executed(result, ctx))
    }

    pub async fn resolve_version(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Option<VersionInfo> {
        command.resolve_version(ctx, self.backend.as_ref(), &self.versions).await
    }
}

fn log_executed(result: CommandResult, ctx: &CommandContext) -> CommandResult {
    let meta = result.metadata();
    tracing::info!(
        invocation = %meta.invocation,
        target_host = %ctx.target(),
        exit_code = result.exit_code(),
        success = result.success(),
        elapsed_ms = meta.duration_ms,
        "executed"
    );
    result
}

#[async_trait]
impl StepRunner for Executor {
    async fn run_step(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        self.execute(command, ctx).await
    }

    fn record_step(&self, run_id: Uuid, step: usize, result: &CommandResult, target: &str) {
        let Some(audit) = &self.audit else { return };
        let meta = result.metadata();
        let record = AuditRecord {
            run_id,
            step,
            invocation: meta.invocation.clone(),
            started_at: meta.started_at,
            finished_at: meta.finished_at,
            exit_code: result.exit_code(),
            success: result.success(),
            backend: meta.backend,
            target: target.to_string(),
        };
        // The audit log must not break execution
        if let Err(e) = audit.append(&record) {
            tracing::warn!(%run_id, step, error = %e, "failed to write audit record");
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
