// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmdx-adapters: execution backends (local process, remote session pool)

mod backend;
mod local;
mod registry;
pub mod remote;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

pub use backend::{BackendError, ExecutionBackend, RawOutput};
pub use local::LocalBackend;
pub use registry::BackendRegistry;
pub use remote::{Connector, RemoteBackend, RemoteSession, SessionError, SessionPool, SshConnector};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackend, FakeConnector, FakeResponse};
