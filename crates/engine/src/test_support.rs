// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine unit tests.

use std::sync::Arc;

use cmdx_adapters::{ExecutionBackend, FakeBackend};
use cmdx_core::CommandContext;

use crate::executor::Executor;
use crate::version::VersionService;

pub const LS_LINE: &str = "-rw-r--r-- 1 user group 1024 Jan 1 12:00 file1.txt\n";
pub const GNU_LS_VERSION: &str = "ls (GNU coreutils) 9.4\nCopyright (C) 2023 Free Software\n";

pub fn ctx() -> CommandContext {
    CommandContext::new("/srv").unwrap()
}

/// Fake backend where `ls` is GNU coreutils 9.4 and lists one file.
pub fn gnu_backend() -> FakeBackend {
    let backend = FakeBackend::new();
    backend.on_stdout("ls --version", GNU_LS_VERSION);
    backend.on_stdout("ls -l", LS_LINE);
    backend
}

pub fn executor(backend: &FakeBackend) -> Arc<Executor> {
    let backend: Arc<dyn ExecutionBackend> = Arc::new(backend.clone());
    Arc::new(Executor::new(backend, Arc::new(VersionService::default())))
}
