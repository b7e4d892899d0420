// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cmdx_core::FailureKind;

fn invocation(program: &str, args: &[&str]) -> Invocation {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let rendered = cmdx_shell::render(program, &args);
    Invocation::new(program, args, rendered)
}

fn ctx() -> (tempfile::TempDir, CommandContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CommandContext::new(dir.path()).unwrap();
    (dir, ctx)
}

#[test]
fn privileged_context_prefixes_noninteractive_sudo() {
    let (_dir, ctx) = ctx();
    let backend = LocalBackend::default();
    let spec = backend.process_spec(&invocation("ls", &["-l"]), &ctx.with_privileged(true));
    assert_eq!(spec.program, "sudo");
    assert_eq!(spec.args, ["-n", "ls", "-l"]);
}

#[test]
fn privileged_context_passes_env_inside_sudo() {
    let (_dir, ctx) = ctx();
    let ctx = ctx.with_env("LC_ALL", "C").with_env("GREETING", "hi there").with_privileged(true);
    let spec = LocalBackend::default().process_spec(&invocation("ls", &["-l"]), &ctx);
    assert_eq!(spec.program, "sudo");
    assert_eq!(spec.args, ["-n", "env", "GREETING=hi there", "LC_ALL=C", "ls", "-l"]);
}

#[test]
fn spec_carries_context_env_and_timeout() {
    let (_dir, ctx) = ctx();
    let ctx = ctx.with_env("LC_ALL", "C").with_timeout(Duration::from_secs(2));
    let spec = LocalBackend::default().process_spec(&invocation("ls", &[]), &ctx);
    assert_eq!(spec.env, [("LC_ALL".to_string(), "C".to_string())]);
    assert_eq!(spec.timeout, Duration::from_secs(2));
    assert_eq!(spec.cwd, ctx.working_dir());
}

#[tokio::test]
async fn executes_in_context_directory() {
    let (dir, ctx) = ctx();
    std::fs::write(dir.path().join("file1.txt"), "x").unwrap();

    let out = LocalBackend::default().execute(&invocation("ls", &[]), &ctx).await.unwrap();

    assert_eq!(out.stdout, "file1.txt\n");
    assert_eq!(out.exit_code, 0);
}

#[tokio::test]
async fn nonzero_exit_is_output_not_error() {
    let (_dir, ctx) = ctx();
    let out = LocalBackend::default()
        .execute(&invocation("ls", &["does-not-exist"]), &ctx)
        .await
        .unwrap();
    assert_ne!(out.exit_code, 0);
    assert!(out.stderr.contains("does-not-exist"));
}

#[tokio::test]
async fn pipes_invocation_stdin() {
    let (_dir, ctx) = ctx();
    let inv = invocation("cat", &[]).with_stdin("piped\n");
    let out = LocalBackend::default().execute(&inv, &ctx).await.unwrap();
    assert_eq!(out.stdout, "piped\n");
}

#[tokio::test]
async fn timeout_maps_to_timeout_failure() {
    let (_dir, ctx) = ctx();
    let ctx = ctx.with_timeout(Duration::from_millis(100));
    let err =
        LocalBackend::default().execute(&invocation("sleep", &["10"]), &ctx).await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Timeout);
}

#[tokio::test]
async fn missing_program_maps_to_execution_failure() {
    let (_dir, ctx) = ctx();
    let err = LocalBackend::default()
        .execute(&invocation("cmdx-no-such-tool", &[]), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Execution);
}
