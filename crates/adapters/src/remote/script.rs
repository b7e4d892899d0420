// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cmdx_core::{CommandContext, Invocation};
use cmdx_shell::quote;

/// The script a remote shell runs for `invocation` under `ctx`:
/// `cd <dir> && [sudo -n] [env K=V ...] <invocation>`.
///
/// `env` goes after `sudo` so the variables survive sudo's environment reset.
pub fn remote_script(invocation: &Invocation, ctx: &CommandContext) -> String {
    let mut script = format!("cd {} && ", quote(&ctx.working_dir().to_string_lossy()));
    if ctx.is_privileged() {
        script.push_str("sudo -n ");
    }
    if !ctx.env().is_empty() {
        script.push_str("env");
        for (key, value) in ctx.env() {
            script.push(' ');
            script.push_str(&quote(&format!("{key}={value}")));
        }
        script.push(' ');
    }
    script.push_str(invocation.rendered());
    script
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
