// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chains of real processes.

use crate::prelude::*;

#[tokio::test]
async fn piped_chain_feeds_stdout_into_the_next_step() {
    let dir = tempfile::tempdir().unwrap();
    let chain = CommandChain::new()
        .pipe(Command::plain("printf").with_arg("banana\napple\ncherry\n"))
        .pipe(Command::plain("sort"))
        .pipe(Command::plain("tr").with_args(["a-z", "A-Z"]));

    let result = runtime().run_chain(&chain, &context(dir.path())).await.unwrap();

    assert!(result.success());
    assert_eq!(result.stdout(), "APPLE\nBANANA\nCHERRY\n");
    assert_eq!(result.history().len(), 3);
    assert!(result.metadata().invocation.contains(" | sort | "));
}

#[tokio::test]
async fn sequential_step_runs_only_after_a_successful_probe() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present");
    std::fs::create_dir(&present).unwrap();

    let chain_for = |target: &std::path::Path| {
        CommandChain::new()
            .then(Command::plain("test").with_arg("-d").with_arg(target.display().to_string()))
            .continue_on_error()
            .then_with(|prev, _| match prev {
                Some(prev) if prev.exit_code() == 0 => {
                    StepPlan::run(Command::plain("echo").with_arg("found"))
                }
                _ => StepPlan::Skip,
            })
    };

    let runtime = runtime();
    let ctx = context(dir.path());
    let found = runtime.run_chain(&chain_for(&present), &ctx).await.unwrap();
    let missing = runtime.run_chain(&chain_for(&dir.path().join("absent")), &ctx).await.unwrap();

    assert!(found.success());
    assert_eq!(found.stdout(), "found\n");
    assert_eq!(missing.history().len(), 1);
    assert_eq!(missing.exit_code(), 1);
    assert!(!missing.success());
}

#[tokio::test]
async fn failing_step_halts_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let chain = CommandChain::new()
        .then(Command::plain("false"))
        .then(Command::plain("touch").with_arg(marker.display().to_string()));

    let result = runtime().run_chain(&chain, &context(dir.path())).await.unwrap();

    assert!(!result.success());
    assert_eq!(result.history().len(), 1);
    assert!(!marker.exists());
}
