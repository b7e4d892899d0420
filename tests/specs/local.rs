// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local execution against real processes.

use crate::prelude::*;

#[tokio::test]
async fn echo_succeeds_with_exact_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let result = runtime()
        .execute(&Command::plain("echo").with_arg("hello world"), &context(dir.path()))
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.stdout(), "hello world\n");
    assert_eq!(result.metadata().invocation, "echo 'hello world'");
}

#[tokio::test]
async fn stdin_reaches_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = Command::plain("cat").with_stdin("line one\nline two\n");

    let result = runtime().execute(&cmd, &context(dir.path())).await.unwrap();

    assert_eq!(result.stdout(), "line one\nline two\n");
}

#[tokio::test]
async fn environment_and_working_directory_apply() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).with_env("CMDX_SPEC_VALUE", "42");

    let result = runtime().execute(&sh("echo $CMDX_SPEC_VALUE; pwd"), &ctx).await.unwrap();

    let lines: Vec<&str> = result.stdout().lines().collect();
    assert_eq!(lines[0], "42");
    let reported = std::fs::canonicalize(lines[1]).unwrap();
    assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
}

#[tokio::test]
async fn nonzero_exit_is_reported_with_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = sh("echo oops >&2; exit 3");
    let result = runtime().execute(&cmd, &context(dir.path())).await.unwrap();

    assert!(!result.success());
    assert_eq!(result.exit_code(), 3);
    assert_eq!(result.stderr(), "oops\n");
    assert!(result.failure().is_none());
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_deadlock() {
    let dir = tempfile::tempdir().unwrap();
    let script = "i=0; while [ $i -lt 4000 ]; do \
                  echo 'out out out out out out out out out out out out out out'; \
                  echo 'err err err err err err err err err err err err err err' >&2; \
                  i=$((i+1)); done";

    let result = runtime().execute(&sh(script), &context(dir.path())).await.unwrap();

    assert!(result.success());
    assert_eq!(result.stdout().lines().count(), 4000);
    assert_eq!(result.stderr().lines().count(), 4000);
}

#[tokio::test]
async fn timeout_kills_the_process_and_reports_it() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path()).with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();

    let result = runtime().execute(&Command::plain("sleep").with_arg("10"), &ctx).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!result.success());
    assert!(result.timed_out());
    assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Timeout));
}

#[tokio::test]
async fn missing_program_is_an_execution_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = runtime()
        .execute(&Command::plain("cmdx-no-such-program"), &context(dir.path()))
        .await
        .unwrap();

    assert!(!result.success());
    assert_eq!(result.exit_code(), -1);
    assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Execution));
}

#[tokio::test]
async fn invalid_commands_fail_before_any_process_starts() {
    let dir = tempfile::tempdir().unwrap();
    let err = runtime()
        .execute(&Command::plain("echo").with_arg("a\0b"), &context(dir.path()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("NUL"), "{err}");
}

#[tokio::test]
async fn ls_long_listing_is_parsed_whatever_the_flavor() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("file1.txt"), "hello").unwrap();
    let path = dir.path().display().to_string();

    let result = runtime().execute(&ls::long(&path), &context(dir.path())).await.unwrap();

    assert!(result.success(), "{:?}", result.warnings());
    let names: Vec<String> = result
        .structured_data()
        .iter()
        .filter_map(|r| r.get("name").and_then(|v| v.as_str()).map(String::from))
        .collect();
    assert_eq!(names, ["file1.txt"], "{:?}", result.warnings());
    assert!(result.metadata().version.is_some());
}
