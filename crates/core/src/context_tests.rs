// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn relative_dir_is_resolved_to_absolute() {
    let ctx = CommandContext::new("some/relative").unwrap();
    assert!(ctx.working_dir().is_absolute());
    assert!(ctx.working_dir().ends_with("some/relative"));
}

#[test]
fn remote_context_requires_absolute_dir() {
    let host = RemoteHost::new("web1", "deploy");
    let err = CommandContext::remote(host.clone(), "relative").unwrap_err();
    assert!(matches!(err, InvocationError::RelativeWorkingDir { .. }));

    let ctx = CommandContext::remote(host, "/srv").unwrap();
    assert_eq!(ctx.backend_kind(), BackendKind::Remote);
    assert_eq!(ctx.target(), "deploy@web1:22");
}

#[test]
fn local_context_targets_local_backend() {
    let ctx = CommandContext::new("/tmp").unwrap();
    assert_eq!(ctx.backend_kind(), BackendKind::Local);
    assert_eq!(ctx.target(), "local");
}

#[test]
fn derivation_never_mutates_the_receiver() {
    let base = CommandContext::new("/tmp").unwrap();
    let derived = base
        .with_env("LANG", "C")
        .with_timeout(Duration::from_secs(2))
        .with_privileged(true)
        .with_dry_run(true);

    assert!(base.env().is_empty());
    assert_eq!(base.timeout(), None);
    assert!(!base.is_privileged());
    assert!(!base.is_dry_run());

    assert_eq!(derived.env().get("LANG").map(String::as_str), Some("C"));
    assert_eq!(derived.timeout(), Some(Duration::from_secs(2)));
    assert!(derived.is_privileged());
    assert!(derived.is_dry_run());
}

#[test]
fn with_working_dir_resolves_against_current_dir() {
    let base = CommandContext::new("/srv/app").unwrap();
    assert_eq!(base.with_working_dir("logs").working_dir(), Path::new("/srv/app/logs"));
    assert_eq!(base.with_working_dir("/var").working_dir(), Path::new("/var"));
}

#[test]
fn digest_is_deterministic_and_order_independent() {
    let a = CommandContext::new("/tmp").unwrap().with_env("A", "1").with_env("B", "2");
    let b = CommandContext::new("/tmp").unwrap().with_env("B", "2").with_env("A", "1");
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.digest().len(), 64);
}

#[yare::parameterized(
    working_dir = { CommandContext::new("/var").unwrap() },
    env         = { CommandContext::new("/tmp").unwrap().with_env("A", "1") },
    privileged  = { CommandContext::new("/tmp").unwrap().with_privileged(true) },
    remote      = { CommandContext::new("/tmp").unwrap().with_remote(RemoteHost::new("h", "u")) },
)]
fn digest_changes_with_output_affecting_fields(changed: CommandContext) {
    let base = CommandContext::new("/tmp").unwrap();
    assert_ne!(base.digest(), changed.digest());
}

#[yare::parameterized(
    timeout = { CommandContext::new("/tmp").unwrap().with_timeout(Duration::from_secs(1)) },
    dry_run = { CommandContext::new("/tmp").unwrap().with_dry_run(true) },
)]
fn digest_ignores_execution_parameters(changed: CommandContext) {
    let base = CommandContext::new("/tmp").unwrap();
    assert_eq!(base.digest(), changed.digest());
}

#[test]
fn effective_timeout_prefers_context() {
    let ctx = CommandContext::new("/tmp").unwrap();
    assert_eq!(ctx.effective_timeout(Duration::from_secs(30)), Duration::from_secs(30));
    let ctx = ctx.with_timeout(Duration::from_millis(10));
    assert_eq!(ctx.effective_timeout(Duration::from_secs(30)), Duration::from_millis(10));
}
