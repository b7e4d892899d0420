// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmdx-engine: commands, tool adapters, version detection, caching and
//! chains on top of the execution backends

mod cache;
mod chain;
mod command;
mod executor;
mod parse;
mod runtime;
mod tool;
pub mod tools;
mod version;

#[cfg(test)]
mod test_support;

pub use cache::{cache_key, CacheError, CacheService};
pub use chain::{CommandChain, StepPlan};
pub use command::Command;
pub use executor::{Executor, StepRunner};
pub use parse::{ParseFn, ParseInput, ParseOutcome};
pub use runtime::{Runtime, RuntimeError, AUDIT_FILE};
pub use tool::{Adapter, Tool};
pub use version::VersionService;
