// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memoized execution with single-flight de-duplication.
//!
//! Only idempotent commands are cached, and never under a dry-run context.
//! The first caller for a key installs a pending placeholder (a watch
//! channel) and executes; concurrent callers for the same key wait on it.
//! If the leader is dropped mid-flight the placeholder goes with it and one
//! of the waiters takes over.
//!
//! Results that carry an execution failure are handed to every waiter but
//! never stored.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cmdx_core::{
    duration_ms, CacheSettings, Clock, CommandContext, CommandResult, Invocation, InvocationError,
    SessionConfig, SystemClock, ToolSettings, VersionInfo,
};
use cmdx_storage::{CacheStore, StoreError, StoredEntry};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::command::Command;
use crate::executor::{Executor, StepRunner};
use crate::tool::Tool;

/// Cache failures. Always recovered: logged, then treated as a miss or a
/// skipped write.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot encode cache key: {0}")]
    Key(#[from] serde_json::Error),

    #[error("cache store: {0}")]
    Store(#[from] StoreError),
}

/// Deterministic key for one (invocation, context, version) triple.
pub fn cache_key(
    invocation: &Invocation,
    ctx: &CommandContext,
    version: &VersionInfo,
) -> Result<String, CacheError> {
    #[derive(Serialize)]
    struct KeyParts {
        invocation: String,
        context: String,
        version: String,
    }

    let parts = KeyParts {
        invocation: invocation.cache_repr(),
        context: ctx.digest(),
        version: version.id(),
    };
    let canonical = serde_json::to_vec(&parts)?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}

struct MemEntry {
    result: CommandResult,
    expires_at: Instant,
}

type Pending = watch::Receiver<Option<CommandResult>>;

enum Role {
    Lead(watch::Sender<Option<CommandResult>>),
    Wait(Pending),
}

/// Removes the pending placeholder when the leader finishes or is dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, Pending>>,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(self.key);
    }
}

pub struct CacheService<C: Clock = SystemClock> {
    executor: Arc<Executor>,
    settings: CacheSettings,
    tools: BTreeMap<String, ToolSettings>,
    store: Option<CacheStore>,
    clock: C,
    entries: Mutex<HashMap<String, MemEntry>>,
    in_flight: Mutex<HashMap<String, Pending>>,
}

impl<C: Clock> CacheService<C> {
    pub fn new(executor: Arc<Executor>, config: &SessionConfig, clock: C) -> Self {
        Self {
            executor,
            settings: config.settings.cache.clone(),
            tools: config.tools.clone(),
            store: None,
            clock,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Persist entries to `store` as well as memory.
    pub fn with_store(mut self, store: CacheStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Number of entries held in memory, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TTL for a tool: the tool's own override, then its configured value,
    /// then the default.
    pub fn ttl_for(&self, tool: &Tool) -> Duration {
        tool.ttl_override()
            .or_else(|| self.tools.get(tool.name()).and_then(ToolSettings::cache_ttl))
            .unwrap_or_else(|| self.settings.default_ttl())
    }

    /// Return a live cached result for `command` in `ctx`, or execute it.
    pub async fn get_or_execute(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        if !self.settings.enabled || !command.is_idempotent() || ctx.is_dry_run() {
            return self.executor.execute(command, ctx).await;
        }
        let version = self.executor.resolve_version(command, ctx).await;
        let Some(key) = self.key_for(command, ctx, version.as_ref())? else {
            return self.executor.execute_with_version(command, ctx, version).await;
        };

        let span = tracing::debug_span!("cmdx.cache", key = &key[..12]);
        self.single_flight(command, ctx, &key, version).instrument(span).await
    }

    /// Plain tools have no version, and key on [`VersionInfo::unknown`].
    fn key_for(
        &self,
        command: &Command,
        ctx: &CommandContext,
        version: Option<&VersionInfo>,
    ) -> Result<Option<String>, InvocationError> {
        let invocation = command.build_invocation(ctx)?;
        let unknown;
        let version = match version {
            Some(version) => version,
            None => {
                unknown = VersionInfo::unknown(command.tool().name());
                &unknown
            }
        };
        match cache_key(&invocation, ctx, version) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                tracing::warn!(error = %e, "bypassing cache");
                Ok(None)
            }
        }
    }

    async fn single_flight(
        &self,
        command: &Command,
        ctx: &CommandContext,
        key: &str,
        version: Option<VersionInfo>,
    ) -> Result<CommandResult, InvocationError> {
        loop {
            if let Some(hit) = self.lookup(key) {
                tracing::debug!("hit");
                return Ok(hit);
            }

            let role = {
                let mut in_flight = self.in_flight.lock();
                match in_flight.get(key) {
                    Some(pending) => Role::Wait(pending.clone()),
                    None => {
                        // A leader that just finished has already stored its
                        // result before clearing its placeholder
                        if let Some(hit) = self.lookup_memory(key) {
                            return Ok(hit);
                        }
                        let (tx, rx) = watch::channel(None);
                        in_flight.insert(key.to_string(), rx);
                        Role::Lead(tx)
                    }
                }
            };

            match role {
                Role::Wait(mut pending) => {
                    tracing::debug!("waiting on in-flight execution");
                    let shared =
                        pending.wait_for(Option::is_some).await.ok().and_then(|v| v.clone());
                    match shared {
                        Some(result) => return Ok(result),
                        None => tracing::debug!("in-flight execution abandoned, retrying"),
                    }
                }
                Role::Lead(tx) => {
                    let _guard = InFlightGuard { in_flight: &self.in_flight, key };
                    tracing::debug!("miss");
                    let result = self
                        .executor
                        .execute_with_version(command, ctx, version.clone())
                        .await?;
                    if result.failure().is_none() {
                        self.insert(key, &result, self.ttl_for(command.tool()));
                    }
                    tx.send_replace(Some(result.clone()));
                    return Ok(result);
                }
            }
        }
    }

    fn lookup_memory(&self, key: &str) -> Option<CommandResult> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if self.clock.now() < entry.expires_at {
            return Some(entry.result.clone());
        }
        entries.remove(key);
        None
    }

    fn lookup(&self, key: &str) -> Option<CommandResult> {
        if let Some(hit) = self.lookup_memory(key) {
            return Some(hit);
        }
        let store = self.store.as_ref()?;
        let now_ms = self.clock.epoch_ms();
        match store.load(key, now_ms) {
            Ok(Some(stored)) => {
                let deadline_ms = stored.created_at_ms.saturating_add(stored.ttl_ms);
                let remaining = deadline_ms.saturating_sub(now_ms);
                let expires_at = self.clock.now() + Duration::from_millis(remaining);
                let entry = MemEntry { result: stored.result.clone(), expires_at };
                self.entries.lock().insert(key.to_string(), entry);
                Some(stored.result)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %CacheError::from(e), "treating cache entry as a miss");
                None
            }
        }
    }

    fn insert(&self, key: &str, result: &CommandResult, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .insert(key.to_string(), MemEntry { result: result.clone(), expires_at });

        let Some(store) = &self.store else { return };
        let stored = StoredEntry {
            key: key.to_string(),
            created_at_ms: self.clock.epoch_ms(),
            ttl_ms: duration_ms(ttl),
            result: result.clone(),
        };
        if let Err(e) = store.save(&stored) {
            tracing::warn!(error = %CacheError::from(e), "skipping cache write");
        }
    }

    /// Drop the entry `command` would hit in `ctx`. Returns whether one was
    /// held in memory.
    pub async fn invalidate(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<bool, InvocationError> {
        let version = self.executor.resolve_version(command, ctx).await;
        let Some(key) = self.key_for(command, ctx, version.as_ref())? else {
            return Ok(false);
        };
        let removed = self.entries.lock().remove(&key).is_some();
        if let Some(store) = &self.store {
            if let Err(e) = store.remove(&key) {
                tracing::warn!(error = %CacheError::from(e), "failed to remove cache entry");
            }
        }
        Ok(removed)
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %CacheError::from(e), "failed to clear cache store");
            }
        }
    }

    /// Drop expired entries from memory and the store. Returns how many
    /// in-memory entries were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, e| now < e.expires_at);
            before - entries.len()
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.purge_expired(self.clock.epoch_ms()) {
                tracing::warn!(error = %CacheError::from(e), "failed to purge cache store");
            }
        }
        removed
    }
}

#[async_trait]
impl<C: Clock> StepRunner for CacheService<C> {
    async fn run_step(
        &self,
        command: &Command,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        self.get_or_execute(command, ctx).await
    }

    fn record_step(&self, run_id: Uuid, step: usize, result: &CommandResult, target: &str) {
        self.executor.record_step(run_id, step, result, target);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
