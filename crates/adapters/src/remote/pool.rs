// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool of live remote sessions keyed by `(host, port, user)`.
//!
//! Each host gets a semaphore bounding concurrent commands (and therefore
//! sessions) to `max_sessions_per_host`, plus a list of sessions each behind
//! its own async mutex. A command locks one idle session for its whole run,
//! so no session ever executes two commands at once. Broken sessions are
//! replaced in place with bounded, exponentially backed-off retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cmdx_core::{RemoteHost, RemoteSettings, SessionKey};
use parking_lot::Mutex;
use tokio::sync::{OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use super::session::{Connector, RemoteSession, SessionError};
use crate::backend::{BackendError, RawOutput};

struct Slot {
    session: Option<Box<dyn RemoteSession>>,
    last_used: Instant,
}

struct HostSessions {
    permits: Arc<Semaphore>,
    slots: Mutex<Vec<Arc<tokio::sync::Mutex<Slot>>>>,
}

/// Exclusive use of one session slot. The slot guard is declared first so it
/// is released before the host permit.
struct Checkout {
    slot: OwnedMutexGuard<Slot>,
    _permit: OwnedSemaphorePermit,
}

pub struct SessionPool {
    connector: Arc<dyn Connector>,
    settings: RemoteSettings,
    hosts: Mutex<HashMap<SessionKey, Arc<HostSessions>>>,
    closed: AtomicBool,
}

impl SessionPool {
    pub fn new(connector: Arc<dyn Connector>, settings: RemoteSettings) -> Self {
        Self {
            connector,
            settings,
            hosts: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    /// Sessions currently pooled for `key`, connected or awaiting reconnect.
    pub fn session_count(&self, key: &SessionKey) -> usize {
        self.hosts.lock().get(key).map_or(0, |host| host.slots.lock().len())
    }

    /// Run `script` on a pooled session for `host`.
    ///
    /// Connection failures and broken sessions are retried up to
    /// `connect_attempts` times, sleeping `backoff` (doubling) between
    /// attempts. Only then is a connection error returned.
    pub async fn run(
        &self,
        host: &RemoteHost,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<RawOutput, BackendError> {
        let key = host.key();
        let mut checkout = self.checkout(&key).await?;
        let attempts = self.settings.connect_attempts.max(1);
        let mut delay = self.settings.backoff();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            match self.try_once(&mut checkout.slot, host, script, stdin, timeout).await {
                Ok(out) => {
                    if attempt > 1 {
                        tracing::info!(target_host = %key, attempt, "reconnected");
                    }
                    return Ok(out);
                }
                Err(SessionError::Timeout(after)) => return Err(BackendError::Timeout { after }),
                Err(e) if !e.is_retryable() => {
                    return Err(BackendError::Connection {
                        target: key.to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        target_host = %key,
                        attempt,
                        attempts,
                        error = %e,
                        "remote attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(BackendError::Connection { target: key.to_string(), attempts, message: last_error })
    }

    /// Close every session and refuse further work.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let hosts: Vec<_> = self.hosts.lock().drain().collect();
        for (key, host) in hosts {
            host.permits.close();
            let slots: Vec<_> = host.slots.lock().drain(..).collect();
            for slot in slots {
                // Waits for an in-flight command on this slot to finish
                let mut slot = slot.lock().await;
                if let Some(mut session) = slot.session.take() {
                    session.close().await;
                }
            }
            tracing::debug!(target_host = %key, "closed remote sessions");
        }
    }

    async fn checkout(&self, key: &SessionKey) -> Result<Checkout, BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(pool_closed());
        }
        let host = self.host(key);
        let permit = host.permits.clone().acquire_owned().await.map_err(|_| pool_closed())?;

        let idle = host.slots.lock().iter().find_map(|slot| slot.clone().try_lock_owned().ok());
        let slot = match idle {
            Some(slot) => slot,
            None => {
                let slot = Arc::new(tokio::sync::Mutex::new(Slot {
                    session: None,
                    last_used: Instant::now(),
                }));
                let guard = slot.clone().lock_owned().await;
                host.slots.lock().push(slot);
                guard
            }
        };
        Ok(Checkout { slot, _permit: permit })
    }

    fn host(&self, key: &SessionKey) -> Arc<HostSessions> {
        let max = self.settings.max_sessions_per_host.max(1);
        self.hosts
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(HostSessions {
                    permits: Arc::new(Semaphore::new(max)),
                    slots: Mutex::new(Vec::new()),
                })
            })
            .clone()
    }

    async fn try_once(
        &self,
        slot: &mut Slot,
        host: &RemoteHost,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<RawOutput, SessionError> {
        let idle_for = slot.last_used.elapsed();
        if let Some(session) = slot.session.as_mut() {
            if idle_for >= self.settings.probe_after_idle() && !session.probe().await {
                tracing::debug!("idle session failed health probe");
                session.close().await;
                slot.session = None;
            }
        }
        if slot.session.is_none() {
            slot.session = Some(self.connect(host).await?);
        }
        let Some(session) = slot.session.as_mut() else {
            return Err(SessionError::Broken("session unavailable".to_string()));
        };

        let result = session.exec(script, stdin, timeout).await;
        slot.last_used = Instant::now();
        if let Err(SessionError::Broken(_)) = &result {
            session.close().await;
            slot.session = None;
        }
        result
    }

    async fn connect(&self, host: &RemoteHost) -> Result<Box<dyn RemoteSession>, SessionError> {
        let connect_timeout = self.settings.connect_timeout();
        match tokio::time::timeout(connect_timeout, self.connector.connect(host)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Connect(format!(
                "no session after {}ms",
                connect_timeout.as_millis()
            ))),
        }
    }
}

fn pool_closed() -> BackendError {
    BackendError::Execution("remote session pool is shut down".to_string())
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
