// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process listings.

use std::sync::{Arc, LazyLock};

use cmdx_core::{ParseError, Version, VersionRange};

use crate::command::Command;
use crate::parse::{header_columns, int_field, split_columns, ParseInput, ParseOutcome};
use crate::tool::{Adapter, Tool};

static PS: LazyLock<Arc<Tool>> = LazyLock::new(|| {
    Arc::new(
        Tool::new("ps")
            .adapter(
                Adapter::new("procps", parse_procps)
                    .flavor("procps")
                    .versions(VersionRange::at_least(Version::new(3, 0, 0))),
            )
            .adapter(Adapter::new("busybox", parse_busybox).flavor("busybox")),
    )
});

pub fn tool() -> Arc<Tool> {
    Arc::clone(&PS)
}

/// Every process with its parent, owner and state.
pub fn processes() -> Command {
    Command::new(tool())
        .with_option("-o", Some("pid,ppid,user,stat,args"))
        .with_flag("-e")
        .idempotent(true)
}

fn parse_procps(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    let mut lines = input.lines();
    let Some((_, header)) = lines.next() else {
        return Ok(ParseOutcome::default());
    };
    header_columns(header, &["PID", "PPID", "USER", "STAT", "COMMAND"])?;

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let (fields, command) = split_columns(line, 4)
            .ok_or_else(|| ParseError::malformed(line_no, "expected 5 columns"))?;
        records.push(cmdx_core::record! {
            "pid" => int_field(fields[0], line_no, "pid")?,
            "ppid" => int_field(fields[1], line_no, "ppid")?,
            "user" => fields[2],
            "stat" => fields[3],
            "command" => command,
        });
    }
    Ok(ParseOutcome::records(records))
}

/// BusyBox prints `PID USER ... COMMAND` with a build-dependent middle.
fn parse_busybox(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    let mut lines = input.lines();
    let Some((_, header)) = lines.next() else {
        return Ok(ParseOutcome::default());
    };
    let idx = header_columns(header, &["PID", "USER", "COMMAND"])?;
    let width = header.split_whitespace().count();
    if idx[2] != width - 1 {
        return Err(ParseError::malformed(1, "COMMAND must be the last column"));
    }

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let (fields, command) = split_columns(line, width - 1)
            .ok_or_else(|| ParseError::malformed(line_no, format!("expected {width} columns")))?;
        records.push(cmdx_core::record! {
            "pid" => int_field(fields[idx[0]], line_no, "pid")?,
            "user" => fields[idx[1]],
            "command" => command,
        });
    }
    Ok(ParseOutcome::records(records))
}

#[cfg(test)]
#[path = "ps_tests.rs"]
mod tests;
