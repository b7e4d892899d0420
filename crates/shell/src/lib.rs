// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmdx-shell: POSIX quoting and the child-process runner

mod error;
mod exec;
pub mod quote;

pub use error::ProcessError;
pub use exec::{run, ProcessOutput, ProcessSpec};
pub use quote::{quote, render};
