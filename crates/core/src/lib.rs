// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmdx-core: data model shared by every cmdx crate

pub mod macros;

pub mod clock;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod invocation;
pub mod record;
pub mod result;
pub mod target;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use clock::{duration_ms, Clock, SystemClock};
pub use config::{CacheSettings, RemoteSettings, SessionConfig, Settings, ToolSettings};
pub use context::CommandContext;
pub use error::{ConfigError, ExecutionFailure, FailureKind, InvocationError, ParseError};
pub use invocation::Invocation;
pub use record::{FieldValue, Record};
pub use result::{CommandResult, ExitClass, ResultBuilder, ResultMetadata, NO_EXIT_CODE};
pub use target::{BackendKind, RemoteAuth, RemoteHost, SessionKey};
pub use version::{Version, VersionInfo, VersionRange};
