// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote execution through the session pool, with a scripted connector.

use crate::prelude::*;
use cmdx_adapters::FakeBackend;

fn remote_runtime(connector: &FakeConnector) -> Runtime {
    init_tracing();
    let config = SessionConfig::default();
    let connector = Arc::new(connector.clone());
    let pool = Arc::new(SessionPool::new(connector, config.settings.remote.clone()));
    let remote = Arc::new(RemoteBackend::new(pool, Duration::from_secs(5)));
    Runtime::with_backends(config, Arc::new(FakeBackend::new()), remote, SystemClock).unwrap()
}

fn remote_ctx() -> CommandContext {
    CommandContext::remote(RemoteHost::new("db1", "ops"), "/srv").unwrap()
}

#[tokio::test(start_paused = true)]
async fn dropped_session_is_replaced_transparently() {
    let connector = FakeConnector::new();
    connector.set_output(RawOutput::new("Linux\n", 0));
    connector.fail_execs(1);
    let runtime = remote_runtime(&connector);

    let result = runtime.execute(&Command::plain("uname"), &remote_ctx()).await.unwrap();

    assert!(result.success());
    assert_eq!(result.stdout(), "Linux\n");
    assert_eq!(connector.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_reconnects_become_a_connection_failure() {
    let connector = FakeConnector::new();
    connector.fail_connects(10);
    let runtime = remote_runtime(&connector);
    let chain = CommandChain::new().then(Command::plain("uname")).then(Command::plain("id"));

    let result = runtime.run_chain(&chain, &remote_ctx()).await.unwrap();

    assert!(!result.success());
    assert_eq!(result.history().len(), 1);
    let failure = result.history()[0].failure().cloned().unwrap();
    assert_eq!(failure.kind, FailureKind::Connection);
    assert!(failure.message.contains("3 attempt"), "{}", failure.message);
    assert_eq!(connector.connects(), 3);
}

#[tokio::test(start_paused = true)]
async fn sessions_are_reused_and_closed_on_shutdown() {
    let connector = FakeConnector::new();
    let runtime = remote_runtime(&connector);

    for _ in 0..3 {
        runtime.execute(&Command::plain("uptime"), &remote_ctx()).await.unwrap();
    }
    runtime.shutdown().await;

    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.execs().len(), 3);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn cache_entries_are_per_target() {
    let connector = FakeConnector::new();
    connector.set_output(RawOutput::new("db1\n", 0));
    let runtime = remote_runtime(&connector);
    let cmd = Command::plain("hostname").idempotent(true);
    let local = CommandContext::new("/srv").unwrap();

    for _ in 0..2 {
        runtime.get_or_execute(&cmd, &remote_ctx()).await.unwrap();
        runtime.get_or_execute(&cmd, &local).await.unwrap();
    }

    assert_eq!(connector.execs().len(), 1);
    assert_eq!(runtime.cache().len(), 2);
}
