// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered command chains.
//!
//! Steps run strictly in declaration order. A piped step receives the
//! previous executed step's stdout on stdin; a sequential step is planned
//! from the previous executed result and may be skipped. The first failed
//! step halts the chain unless it was marked `continue_on_error`.

use std::sync::Arc;

use cmdx_core::{BackendKind, CommandContext, CommandResult, InvocationError};
use tracing::Instrument;
use uuid::Uuid;

use crate::command::Command;
use crate::executor::StepRunner;

/// What a sequential step does, decided from the previous result.
#[derive(Debug, Clone)]
pub enum StepPlan {
    /// Run `command`, in `context` if given, else the chain context.
    Run { command: Command, context: Option<CommandContext> },
    Skip,
}

impl StepPlan {
    pub fn run(command: Command) -> Self {
        StepPlan::Run { command, context: None }
    }

    pub fn run_in(command: Command, context: CommandContext) -> Self {
        StepPlan::Run { command, context: Some(context) }
    }
}

type PlanFn = dyn Fn(Option<&CommandResult>, &CommandContext) -> StepPlan + Send + Sync;

#[derive(Clone)]
enum StepKind {
    Piped(Command),
    Sequential(Arc<PlanFn>),
}

#[derive(Clone)]
struct Step {
    kind: StepKind,
    continue_on_error: bool,
}

impl StepKind {
    fn separator(&self) -> &'static str {
        match self {
            StepKind::Piped(_) => " | ",
            StepKind::Sequential(_) => " ; ",
        }
    }
}

#[derive(Clone, Default)]
pub struct CommandChain {
    steps: Vec<Step>,
}

impl CommandChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step fed the previous step's stdout.
    pub fn pipe(self, command: Command) -> Self {
        self.push(StepKind::Piped(command))
    }

    /// Append a step that always runs `command` in the chain context.
    pub fn then(self, command: Command) -> Self {
        self.then_with(move |_, _| StepPlan::run(command.clone()))
    }

    /// Append a step planned from the previous executed result.
    pub fn then_with<F>(self, plan: F) -> Self
    where
        F: Fn(Option<&CommandResult>, &CommandContext) -> StepPlan + Send + Sync + 'static,
    {
        self.push(StepKind::Sequential(Arc::new(plan)))
    }

    /// Let the chain continue past a failure of the most recently added step.
    pub fn continue_on_error(mut self) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.continue_on_error = true;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(mut self, kind: StepKind) -> Self {
        self.steps.push(Step { kind, continue_on_error: false });
        self
    }

    /// Run every step through `runner`, returning the aggregated result.
    ///
    /// Only invocation errors abort the chain with `Err`. Execution
    /// failures land in the failed step's result and halt it like any other
    /// failure.
    pub async fn run(
        &self,
        runner: &dyn StepRunner,
        ctx: &CommandContext,
    ) -> Result<CommandResult, InvocationError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("cmdx.chain", %run_id, steps = self.steps.len());
        self.run_steps(runner, ctx, run_id).instrument(span).await
    }

    async fn run_steps(
        &self,
        runner: &dyn StepRunner,
        ctx: &CommandContext,
        run_id: Uuid,
    ) -> Result<CommandResult, InvocationError> {
        let mut history: Vec<CommandResult> = Vec::new();
        let mut invocation = String::new();

        for (index, step) in self.steps.iter().enumerate() {
            let previous = history.last();
            let (command, step_ctx) = match &step.kind {
                StepKind::Piped(command) => match previous {
                    Some(prev) => (command.with_stdin(prev.stdout()), ctx.clone()),
                    None => (command.clone(), ctx.clone()),
                },
                StepKind::Sequential(plan) => match plan(previous, ctx) {
                    StepPlan::Run { command, context } => {
                        (command, context.unwrap_or_else(|| ctx.clone()))
                    }
                    StepPlan::Skip => {
                        tracing::debug!(step = index, "skipped");
                        continue;
                    }
                },
            };

            let result = runner.run_step(&command, &step_ctx).await?;
            runner.record_step(run_id, index, &result, &step_ctx.target());

            if !invocation.is_empty() {
                invocation.push_str(step.kind.separator());
            }
            invocation.push_str(&result.metadata().invocation);

            let halt = !result.success() && !step.continue_on_error;
            history.push(result);
            if halt {
                tracing::info!(step = index, "step failed, halting chain");
                break;
            }
        }

        Ok(aggregate(invocation, history, ctx.backend_kind()))
    }
}

fn aggregate(
    invocation: String,
    history: Vec<CommandResult>,
    backend: BackendKind,
) -> CommandResult {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return CommandResult::builder(invocation, backend).build();
    };

    let mut warnings: Vec<String> = Vec::new();
    for warning in history.iter().flat_map(CommandResult::warnings) {
        if !warnings.contains(warning) {
            warnings.push(warning.clone());
        }
    }

    let mut builder = CommandResult::builder(invocation, last.metadata().backend)
        .stdout(last.stdout())
        .stderr(last.stderr())
        .exit_code(last.exit_code())
        .structured(last.structured_data().to_vec())
        .timing(first.metadata().started_at, last.metadata().finished_at)
        .warnings(warnings)
        .exit_class(last.metadata().exit_class);
    if !history.iter().all(CommandResult::success) {
        builder = builder.failed();
    }
    builder.history(history).build()
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
