// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeBackend;
use cmdx_core::RemoteHost;

fn ls() -> Invocation {
    Invocation::new("ls", vec![], "ls")
}

fn registry() -> (FakeBackend, FakeBackend, BackendRegistry) {
    let local = FakeBackend::new();
    let remote = FakeBackend::remote();
    let registry = BackendRegistry::new(Arc::new(local.clone()), Arc::new(remote.clone()));
    (local, remote, registry)
}

#[tokio::test]
async fn context_without_remote_runs_locally() {
    let (local, remote, registry) = registry();
    let ctx = CommandContext::new("/tmp").unwrap();

    registry.execute(&ls(), &ctx).await.unwrap();

    assert_eq!(local.call_count(), 1);
    assert_eq!(remote.call_count(), 0);
    assert_eq!(registry.select(&ctx).kind(), BackendKind::Local);
}

#[tokio::test]
async fn context_with_remote_runs_remotely() {
    let (local, remote, registry) = registry();
    let ctx = CommandContext::remote(RemoteHost::new("db1", "ops"), "/srv").unwrap();

    registry.execute(&ls(), &ctx).await.unwrap();

    assert_eq!(local.call_count(), 0);
    assert_eq!(remote.calls()[0].target, "ops@db1:22");
    assert_eq!(registry.select(&ctx).kind(), BackendKind::Remote);
}

#[tokio::test]
async fn register_replaces_one_kind() {
    let (local, _remote, registry) = registry();
    let replacement = FakeBackend::new();
    let registry = registry.register(BackendKind::Local, Arc::new(replacement.clone()));

    registry.execute(&ls(), &CommandContext::new("/tmp").unwrap()).await.unwrap();

    assert_eq!(local.call_count(), 0);
    assert_eq!(replacement.call_count(), 1);
}
