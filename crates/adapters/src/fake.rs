// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fakes for tests.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cmdx_core::{BackendKind, CommandContext, Invocation, RemoteHost};
use parking_lot::Mutex;

use crate::backend::{BackendError, ExecutionBackend, RawOutput};
use crate::remote::{Connector, RemoteSession, SessionError};

/// Recorded backend call
#[derive(Debug, Clone)]
pub struct BackendCall {
    pub rendered: String,
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub privileged: bool,
    pub target: String,
}

/// What a [`FakeBackend`] returns for a matching invocation.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Output(RawOutput),
    Error(BackendError),
    /// Echo stdin back as stdout, like `cat`.
    Echo,
}

struct FakeBackendState {
    rules: Vec<(String, FakeResponse)>,
    default: FakeResponse,
    calls: Vec<BackendCall>,
    delay: Option<Duration>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Fake execution backend for testing.
///
/// Responses are matched by prefix of the rendered invocation; the most
/// recently registered matching rule wins. Unmatched invocations get the
/// default response (empty stdout, exit 0).
#[derive(Clone)]
pub struct FakeBackend {
    kind: BackendKind,
    inner: Arc<Mutex<FakeBackendState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::with_kind(BackendKind::Local)
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote() -> Self {
        Self::with_kind(BackendKind::Remote)
    }

    fn with_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            inner: Arc::new(Mutex::new(FakeBackendState {
                rules: Vec::new(),
                default: FakeResponse::Output(RawOutput::default()),
                calls: Vec::new(),
                delay: None,
                in_flight: 0,
                max_in_flight: 0,
            })),
        }
    }

    pub fn respond(&self, prefix: impl Into<String>, response: FakeResponse) {
        self.inner.lock().rules.push((prefix.into(), response));
    }

    pub fn on_stdout(&self, prefix: impl Into<String>, stdout: impl Into<String>) {
        self.respond(prefix, FakeResponse::Output(RawOutput::new(stdout, 0)));
    }

    pub fn on_exit(&self, prefix: impl Into<String>, output: RawOutput) {
        self.respond(prefix, FakeResponse::Output(output));
    }

    pub fn on_error(&self, prefix: impl Into<String>, error: BackendError) {
        self.respond(prefix, FakeResponse::Error(error));
    }

    pub fn set_default(&self, response: FakeResponse) {
        self.inner.lock().default = response;
    }

    /// Sleep this long inside every execution (tokio time).
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Number of calls whose rendered invocation starts with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.inner.lock().calls.iter().filter(|c| c.rendered.starts_with(prefix)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }
}

#[async_trait]
impl ExecutionBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
    ) -> Result<RawOutput, BackendError> {
        let (response, delay) = {
            let mut state = self.inner.lock();
            state.calls.push(BackendCall {
                rendered: invocation.rendered().to_string(),
                program: invocation.program().to_string(),
                args: invocation.args().to_vec(),
                stdin: invocation.stdin().map(<[u8]>::to_vec),
                working_dir: ctx.working_dir().to_path_buf(),
                env: ctx.env().clone(),
                privileged: ctx.is_privileged(),
                target: ctx.target(),
            });
            let response = state
                .rules
                .iter()
                .rev()
                .find(|(prefix, _)| invocation.rendered().starts_with(prefix.as_str()))
                .map_or_else(|| state.default.clone(), |(_, r)| r.clone());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            (response, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.lock().in_flight -= 1;

        match response {
            FakeResponse::Output(out) => Ok(out),
            FakeResponse::Error(e) => Err(e),
            FakeResponse::Echo => {
                let stdin = invocation.stdin().unwrap_or_default();
                Ok(RawOutput::new(String::from_utf8_lossy(stdin), 0))
            }
        }
    }
}

struct FakeConnectorState {
    connect_failures: u32,
    exec_failures: u32,
    probe_ok: bool,
    output: RawOutput,
    exec_delay: Option<Duration>,
    connects: u32,
    closes: u32,
    probes: u32,
    next_session: u32,
    /// `(session id, script)` per successful exec
    execs: Vec<(u32, String)>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Fake remote connector with scriptable connection drops.
#[derive(Clone)]
pub struct FakeConnector {
    inner: Arc<Mutex<FakeConnectorState>>,
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeConnectorState {
                connect_failures: 0,
                exec_failures: 0,
                probe_ok: true,
                output: RawOutput::default(),
                exec_delay: None,
                connects: 0,
                closes: 0,
                probes: 0,
                next_session: 0,
                execs: Vec::new(),
                in_flight: 0,
                max_in_flight: 0,
            })),
        }
    }
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` connect attempts fail.
    pub fn fail_connects(&self, n: u32) {
        self.inner.lock().connect_failures = n;
    }

    /// The next `n` execs report a broken session.
    pub fn fail_execs(&self, n: u32) {
        self.inner.lock().exec_failures = n;
    }

    pub fn set_probe_ok(&self, ok: bool) {
        self.inner.lock().probe_ok = ok;
    }

    pub fn set_output(&self, output: RawOutput) {
        self.inner.lock().output = output;
    }

    pub fn set_exec_delay(&self, delay: Duration) {
        self.inner.lock().exec_delay = Some(delay);
    }

    /// Total connect attempts, successful or not.
    pub fn connects(&self) -> u32 {
        self.inner.lock().connects
    }

    pub fn closes(&self) -> u32 {
        self.inner.lock().closes
    }

    pub fn probes(&self) -> u32 {
        self.inner.lock().probes
    }

    pub fn execs(&self) -> Vec<(u32, String)> {
        self.inner.lock().execs.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, host: &RemoteHost) -> Result<Box<dyn RemoteSession>, SessionError> {
        let mut state = self.inner.lock();
        state.connects += 1;
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(SessionError::Connect(format!("simulated drop for {}", host.key())));
        }
        state.next_session += 1;
        Ok(Box::new(FakeSession { id: state.next_session, inner: Arc::clone(&self.inner) }))
    }
}

struct FakeSession {
    id: u32,
    inner: Arc<Mutex<FakeConnectorState>>,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn exec(
        &mut self,
        script: &str,
        _stdin: Option<&[u8]>,
        _timeout: Duration,
    ) -> Result<RawOutput, SessionError> {
        let (output, delay) = {
            let mut state = self.inner.lock();
            if state.exec_failures > 0 {
                state.exec_failures -= 1;
                return Err(SessionError::Broken("simulated connection reset".to_string()));
            }
            state.execs.push((self.id, script.to_string()));
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            (state.output.clone(), state.exec_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.lock().in_flight -= 1;
        Ok(output)
    }

    async fn probe(&mut self) -> bool {
        let mut state = self.inner.lock();
        state.probes += 1;
        state.probe_ok
    }

    async fn close(&mut self) {
        self.inner.lock().closes += 1;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
