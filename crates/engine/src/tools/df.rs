// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `df -P` in POSIX output format.

use std::sync::{Arc, LazyLock};

use cmdx_core::{FieldValue, ParseError};

use crate::command::Command;
use crate::parse::{int_field, ParseInput, ParseOutcome};
use crate::tool::{Adapter, Tool};

static DF: LazyLock<Arc<Tool>> = LazyLock::new(|| {
    Arc::new(Tool::new("df").fallback_flavor("bsd").adapter(Adapter::new("posix", parse_posix)))
});

pub fn tool() -> Arc<Tool> {
    Arc::clone(&DF)
}

/// `df -P [path]`
pub fn posix(path: Option<&str>) -> Command {
    let cmd = Command::new(tool()).with_flag("-P").idempotent(true);
    match path {
        Some(path) => cmd.with_arg(path),
        None => cmd,
    }
}

fn parse_posix(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    let mut lines = input.lines();
    let Some((_, header)) = lines.next() else {
        return Ok(ParseOutcome::default());
    };
    if !header.starts_with("Filesystem") {
        return Err(ParseError::MissingHeader { expected: "Filesystem".to_string() });
    }

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(ParseError::malformed(line_no, "expected 6 columns"));
        }
        let capacity = match fields[4].trim_end_matches('%') {
            "-" => FieldValue::Null,
            pct => FieldValue::Int(int_field(pct, line_no, "capacity")?),
        };
        records.push(cmdx_core::record! {
            "filesystem" => fields[0],
            "blocks" => int_field(fields[1], line_no, "blocks")?,
            "used" => int_field(fields[2], line_no, "used")?,
            "available" => int_field(fields[3], line_no, "available")?,
            "capacity" => capacity,
            "mounted_on" => fields[5..].join(" "),
        });
    }

    // GNU df can print only a header and a complaint while still exiting 0
    if records.is_empty() && input.exit_code == 0 {
        if let Some(complaint) = input.stderr.lines().find(|l| !l.trim().is_empty()) {
            return Ok(ParseOutcome::semantic_failure(format!(
                "df reported no filesystems: {}",
                complaint.trim()
            )));
        }
    }
    Ok(ParseOutcome::records(records))
}

#[cfg(test)]
#[path = "df_tests.rs"]
mod tests;
