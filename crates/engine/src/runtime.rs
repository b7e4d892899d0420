// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session runtime: wires backends, versions, audit and cache from one
//! [`SessionConfig`].

use std::sync::Arc;

use cmdx_adapters::{BackendRegistry, ExecutionBackend, LocalBackend, RemoteBackend};
use cmdx_core::{
    Clock, CommandContext, CommandResult, InvocationError, SessionConfig, SystemClock,
};
use cmdx_storage::{AuditError, AuditLog, CacheStore, StoreError};
use thiserror::Error;

use crate::cache::CacheService;
use crate::chain::CommandChain;
use crate::command::Command;
use crate::executor::Executor;
use crate::version::VersionService;

/// Audit log file name under the state directory.
pub const AUDIT_FILE: &str = "audit.jsonl";

/// Errors opening the runtime's persisted state.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot open cache store: {0}")]
    Store(#[from] StoreError),

    #[error("cannot open audit log: {0}")]
    Audit(#[from] AuditError),
}

pub struct Runtime<C: Clock = SystemClock> {
    config: SessionConfig,
    backends: Arc<BackendRegistry>,
    executor: Arc<Executor>,
    cache: CacheService<C>,
}

impl Runtime {
    /// Runtime with the local process backend and an SSH session pool.
    pub fn new(config: SessionConfig) -> Result<Self, RuntimeError> {
        let timeout = config.settings.timeout();
        let local = Arc::new(LocalBackend::new(timeout));
        let remote = Arc::new(RemoteBackend::ssh(&config.settings.remote, timeout));
        Self::with_backends(config, local, remote, SystemClock)
    }
}

impl<C: Clock> Runtime<C> {
    pub fn with_backends(
        config: SessionConfig,
        local: Arc<dyn ExecutionBackend>,
        remote: Arc<dyn ExecutionBackend>,
        clock: C,
    ) -> Result<Self, RuntimeError> {
        let backends = Arc::new(BackendRegistry::new(local, remote));
        let versions = Arc::new(VersionService::from_config(&config));
        let dispatch: Arc<dyn ExecutionBackend> = backends.clone();
        let mut executor = Executor::new(dispatch, versions);

        if config.settings.audit {
            match config.state_dir() {
                Some(dir) => {
                    let audit = AuditLog::open(dir.join(AUDIT_FILE))?;
                    tracing::info!(path = %audit.path().display(), "audit log open");
                    executor = executor.with_audit(Arc::new(audit));
                }
                None => tracing::warn!("audit enabled but no state directory is available"),
            }
        }

        let executor = Arc::new(executor);
        let mut cache = CacheService::new(Arc::clone(&executor), &config, clock);
        if let Some(dir) = &config.settings.cache.dir {
            cache = cache.with_store(CacheStore::open(dir)?);
        }

        Ok(Self { config, backends, executor, cache })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn versions(&self) -> &Arc<VersionService> {
        self.executor.versions()
    }

    pub fn cache(&self) -> &CacheService<C> {
        &self.cache
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Execute without consulting the cache.
    pub async fn execute(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        self.executor.execute(command, ctx).await
    }

    pub async fn get_or_execute(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        self.cache.get_or_execute(command, ctx).await
    }

    /// Run a chain step-wise through the cache. Non-idempotent steps bypass
    /// it as usual.
    pub async fn run_chain(
        &self,
        chain: &CommandChain,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        chain.run(&self.cache, ctx).await
    }

    /// Close every pooled remote session.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down");
        self.backends.shutdown().await;
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
