// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable command builder.
//!
//! A [`Command`] is pure data until [`Command::execute`] is called. Every
//! `with_*` method returns a new command and leaves the receiver untouched,
//! so partially built commands can be shared and extended freely.

use std::sync::Arc;

use chrono::Utc;
use cmdx_adapters::{ExecutionBackend, RawOutput};
use cmdx_core::{
    CommandContext, CommandResult, ExitClass, Invocation, InvocationError, VersionInfo,
    VersionRange,
};

use crate::parse::ParseInput;
use crate::tool::Tool;
use crate::version::VersionService;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandOption {
    flag: String,
    value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Command {
    tool: Arc<Tool>,
    options: Vec<CommandOption>,
    args: Vec<String>,
    idempotent: bool,
    supported: VersionRange,
    stdin: Option<Vec<u8>>,
}

impl Command {
    pub fn new(tool: Arc<Tool>) -> Self {
        Self {
            tool,
            options: Vec::new(),
            args: Vec::new(),
            idempotent: false,
            supported: VersionRange::ANY,
            stdin: None,
        }
    }

    /// Command for a tool with no parser adapters.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(Arc::new(Tool::new(name)))
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn supported(&self) -> VersionRange {
        self.supported
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    /// Append an option. Long flags render as `--flag=value`, short flags as
    /// two words.
    #[must_use]
    pub fn with_option(&self, flag: impl Into<String>, value: Option<&str>) -> Self {
        let mut next = self.clone();
        next.options.push(CommandOption { flag: flag.into(), value: value.map(String::from) });
        next
    }

    #[must_use]
    pub fn with_flag(&self, flag: impl Into<String>) -> Self {
        self.with_option(flag, None)
    }

    #[must_use]
    pub fn with_arg(&self, arg: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.args.push(arg.into());
        next
    }

    #[must_use]
    pub fn with_args<S: Into<String>>(&self, args: impl IntoIterator<Item = S>) -> Self {
        let mut next = self.clone();
        next.args.extend(args.into_iter().map(Into::into));
        next
    }

    cmdx_core::setters! {
        set {
            idempotent => idempotent: bool,
            supported_versions => supported: VersionRange,
        }
    }

    /// Feed bytes to the process's stdin. Piped chain steps use this.
    #[must_use]
    pub fn with_stdin(&self, stdin: impl Into<Vec<u8>>) -> Self {
        let mut next = self.clone();
        next.stdin = Some(stdin.into());
        next
    }

    fn words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(self.options.len() * 2 + self.args.len());
        for opt in &self.options {
            match &opt.value {
                Some(value) if opt.flag.starts_with("--") => {
                    words.push(format!("{}={}", opt.flag, value));
                }
                Some(value) => {
                    words.push(opt.flag.clone());
                    words.push(value.clone());
                }
                None => words.push(opt.flag.clone()),
            }
        }
        words.extend(self.args.iter().cloned());
        words
    }

    /// Render the invocation for `ctx`. Deterministic: the same command and
    /// context always render the same string.
    pub fn build_invocation(&self, ctx: &CommandContext) -> Result<Invocation, InvocationError> {
        let program = self.tool.name();
        if program.trim().is_empty() {
            return Err(InvocationError::EmptyTool);
        }
        if !ctx.working_dir().is_absolute() {
            return Err(InvocationError::RelativeWorkingDir { path: ctx.working_dir().into() });
        }
        for opt in &self.options {
            if !opt.flag.starts_with('-') || opt.flag.trim_start_matches('-').is_empty() {
                return Err(InvocationError::InvalidArgument {
                    arg: opt.flag.clone(),
                    reason: "option flags must start with '-' and name a flag".to_string(),
                });
            }
        }
        self.tool
            .check_options(self.options.iter().map(|o| (o.flag.as_str(), o.value.as_deref())))?;

        let words = self.words();
        let mut all_words = std::iter::once(program).chain(words.iter().map(String::as_str));
        if let Some(bad) = all_words.find(|w| w.contains('\0')) {
            return Err(InvocationError::InvalidArgument {
                arg: bad.replace('\0', "\\0"),
                reason: "contains a NUL byte".to_string(),
            });
        }

        let rendered = cmdx_shell::render(program, &words);
        let invocation = Invocation::new(program, words, rendered);
        Ok(match &self.stdin {
            Some(stdin) => invocation.with_stdin(stdin.clone()),
            None => invocation,
        })
    }

    /// Build, execute and parse.
    ///
    /// Only [`InvocationError`] is returned as an error. Backend failures,
    /// timeouts and parse errors all land in the result.
    pub async fn execute(
        &self,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
        versions: &VersionService,
    ) -> Result<CommandResult, InvocationError> {
        let invocation = self.build_invocation(ctx)?;
        if ctx.is_dry_run() {
            return Ok(dry_run(&invocation, ctx));
        }
        let version = self.resolve_version(ctx, backend, versions).await;
        Ok(self.run(&invocation, ctx, backend, version).await)
    }

    /// Like [`execute`](Self::execute), with the version already resolved.
    ///
    /// Lets a caller that needed the version beforehand (the cache, to build
    /// its key) parse with exactly that answer instead of detecting again.
    pub async fn execute_with_version(
        &self,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
        version: Option<VersionInfo>,
    ) -> Result<CommandResult, InvocationError> {
        let invocation = self.build_invocation(ctx)?;
        if ctx.is_dry_run() {
            return Ok(dry_run(&invocation, ctx));
        }
        Ok(self.run(&invocation, ctx, backend, version).await)
    }

    /// The version this command parses against. `None` for plain tools, which
    /// are never probed.
    pub async fn resolve_version(
        &self,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
        versions: &VersionService,
    ) -> Option<VersionInfo> {
        if self.tool.is_plain() {
            return None;
        }
        Some(versions.resolve(&self.tool, ctx, backend).await)
    }

    async fn run(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
        backend: &dyn ExecutionBackend,
        version: Option<VersionInfo>,
    ) -> CommandResult {
        let started_at = Utc::now();
        let raw = backend.execute(invocation, ctx).await;
        let finished_at = Utc::now();

        match raw {
            Ok(raw) => self.parse_output(invocation, ctx, raw, version),
            Err(e) => {
                tracing::warn!(invocation = %invocation, error = %e, "execution failed");
                let mut builder =
                    CommandResult::builder(invocation.rendered(), ctx.backend_kind())
                        .timing(started_at, finished_at)
                        .failure(e.to_failure());
                if let Some(version) = version {
                    builder = builder.version(version);
                }
                builder.build()
            }
        }
    }

    /// Turn raw backend output into a result, dispatching to the parser
    /// adapter `version` selected.
    ///
    /// Never fails: unknown versions, unsupported versions and parser errors
    /// produce a raw-only result with a warning.
    pub fn parse_output(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext,
        raw: RawOutput,
        version: Option<VersionInfo>,
    ) -> CommandResult {
        let finished_at = Utc::now();
        let started_at = chrono::Duration::from_std(raw.duration)
            .map(|d| finished_at - d)
            .unwrap_or(finished_at);
        let tool = self.tool.name();
        let class = self.tool.classify_exit(raw.exit_code);

        let mut builder = CommandResult::builder(invocation.rendered(), ctx.backend_kind())
            .exit_code(raw.exit_code)
            .exit_class(class)
            .timing(started_at, finished_at);
        if class == ExitClass::Failed {
            builder = builder.warning(format!("{tool} exited with status {}", raw.exit_code));
        }
        if raw.invalid_utf8 {
            builder = builder.warning(format!("{tool} output was not valid UTF-8; bytes replaced"));
        }

        if let Some(info) = version {
            let shown = info.version.map(|v| v.to_string());
            let shown = shown.as_deref().unwrap_or("unknown version");
            let in_range = self.supported.is_any()
                || info.version.is_some_and(|v| self.supported.contains(&v));
            let adapter = info.adapter.as_deref().and_then(|id| self.tool.adapter_by_id(id));

            match adapter {
                _ if !in_range => {
                    builder = builder.warning(format!(
                        "{tool} {shown} is outside supported range {}; returning raw output",
                        self.supported
                    ));
                }
                None => {
                    builder = builder
                        .warning(format!("no parser for {tool} {shown}; returning raw output"));
                }
                Some(adapter) if raw.exit_code != 0 && !adapter.parses_errors() => {}
                Some(adapter) => {
                    let input = ParseInput::new(&raw.stdout, &raw.stderr, raw.exit_code);
                    match adapter.parse(&input) {
                        Ok(outcome) => {
                            builder = builder.structured(outcome.records);
                            if let Some(reason) = outcome.semantic_failure {
                                builder = builder.downgrade(reason);
                            }
                        }
                        Err(e) => {
                            let id = adapter.id();
                            tracing::debug!(tool, adapter = id, error = %e, "parse failed");
                            builder = builder.warning(format!("parse error ({id}): {e}"));
                        }
                    }
                }
            }
            builder = builder.version(info);
        }

        builder.stdout(raw.stdout).stderr(raw.stderr).build()
    }
}

fn dry_run(invocation: &Invocation, ctx: &CommandContext) -> CommandResult {
    tracing::debug!(invocation = %invocation, "dry run");
    CommandResult::builder(invocation.rendered(), ctx.backend_kind()).warning("dry run").build()
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
