// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached execution of real processes.

use crate::prelude::*;

/// Prints something different on every run.
fn counter(file: &std::path::Path) -> Command {
    let script = format!("echo x >> '{}'; wc -l < '{}'", file.display(), file.display());
    sh(&script).idempotent(true)
}

fn cached_runtime(cache_dir: &std::path::Path) -> Runtime {
    init_tracing();
    let mut config = SessionConfig::default();
    config.settings.cache.dir = Some(cache_dir.to_path_buf());
    Runtime::new(config).unwrap()
}

#[tokio::test]
async fn idempotent_commands_run_once_per_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = runtime();
    let ctx = context(dir.path());
    let cmd = counter(&dir.path().join("count"));

    let first = runtime.get_or_execute(&cmd, &ctx).await.unwrap();
    let second = runtime.get_or_execute(&cmd, &ctx).await.unwrap();
    let uncached = runtime.execute(&cmd, &ctx).await.unwrap();

    assert_eq!(first.stdout().trim(), "1");
    assert_eq!(second.stdout().trim(), "1");
    assert_eq!(uncached.stdout().trim(), "2");
}

#[tokio::test]
async fn non_idempotent_commands_are_never_cached() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = runtime();
    let ctx = context(dir.path());
    let cmd = counter(&dir.path().join("count")).idempotent(false);

    runtime.get_or_execute(&cmd, &ctx).await.unwrap();
    let second = runtime.get_or_execute(&cmd, &ctx).await.unwrap();

    assert_eq!(second.stdout().trim(), "2");
}

#[tokio::test]
async fn persisted_results_survive_a_new_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let ctx = context(dir.path());
    let cmd = counter(&dir.path().join("count"));

    let first = cached_runtime(&cache_dir).get_or_execute(&cmd, &ctx).await.unwrap();
    let restarted = cached_runtime(&cache_dir).get_or_execute(&cmd, &ctx).await.unwrap();

    assert_eq!(first.stdout(), restarted.stdout());
    assert_eq!(std::fs::read_to_string(dir.path().join("count")).unwrap(), "x\n");
}

#[tokio::test]
async fn corrupt_persisted_entries_are_re_executed() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let ctx = context(dir.path());
    let cmd = counter(&dir.path().join("count"));

    cached_runtime(&cache_dir).get_or_execute(&cmd, &ctx).await.unwrap();
    for entry in std::fs::read_dir(&cache_dir).unwrap() {
        std::fs::write(entry.unwrap().path(), b"not zstd").unwrap();
    }
    let result = cached_runtime(&cache_dir).get_or_execute(&cmd, &ctx).await.unwrap();

    assert!(result.success());
    assert_eq!(result.stdout().trim(), "2");
}
