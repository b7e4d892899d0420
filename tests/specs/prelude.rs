// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the behavioural specs.

#![allow(dead_code, unused_imports)]

use std::path::Path;
use std::sync::Once;

pub use cmdx_adapters::{FakeConnector, LocalBackend, RawOutput, RemoteBackend, SessionPool};
pub use cmdx_core::{
    CommandContext, CommandResult, FailureKind, RemoteHost, SessionConfig, SystemClock,
};
pub use cmdx_engine::tools::{df, ls, ps};
pub use cmdx_engine::{Command, CommandChain, Runtime, StepPlan};
pub use std::sync::Arc;
pub use std::time::Duration;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Runtime with default settings and real local execution.
pub fn runtime() -> Runtime {
    init_tracing();
    Runtime::new(SessionConfig::default()).unwrap()
}

pub fn context(dir: &Path) -> CommandContext {
    CommandContext::new(dir).unwrap()
}

pub fn sh(script: &str) -> Command {
    Command::plain("sh").with_args(["-c", script])
}
