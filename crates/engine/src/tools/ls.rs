// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ls` long listings.
//!
//! The three adapters share one entry grammar. They differ in the attribute
//! marker allowed after the permission bits (GNU prints `.`/`+` for SELinux
//! and ACLs, BSD prints `@`/`+` for extended attributes and ACLs, BusyBox
//! prints none) and in how a missing operand is reported on stderr.

use std::sync::{Arc, LazyLock};

use cmdx_core::{FieldValue, ParseError, Record};
use regex::Regex;

use crate::command::Command;
use crate::parse::{int_field, ParseInput, ParseOutcome};
use crate::tool::{Adapter, Tool};

const LONG_ENTRY: &str = r"(?x)
    ^(?P<permissions>[-bcdlpsDw?][-rwxsStTlL]{9})
    ATTR
    \s+\d+
    \s+(?P<owner>\S+)
    \s+(?P<group>\S+)
    \s+(?P<size>\d+,\s*\d+|\d+)
    \s+(?:
        [A-Z][a-z]{2}\s+\d{1,2}\s+(?:\d{1,2}:\d{2}|\d{4})
      | \d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s+[+-]\d{4})?
    )
    \s(?P<name>.+)$";

// Allow expect here as the regex patterns are compile-time constants
#[allow(clippy::expect_used)]
fn entry_pattern(attr: &str) -> Regex {
    Regex::new(&LONG_ENTRY.replace("ATTR", attr)).expect("constant regex pattern is valid")
}

#[allow(clippy::expect_used)]
fn missing_pattern(pattern: &str) -> Regex {
    Regex::new(pattern).expect("constant regex pattern is valid")
}

static GNU_ENTRY: LazyLock<Regex> = LazyLock::new(|| entry_pattern("[.+]?"));
static BSD_ENTRY: LazyLock<Regex> = LazyLock::new(|| entry_pattern("[@+]?"));
static BUSYBOX_ENTRY: LazyLock<Regex> = LazyLock::new(|| entry_pattern(""));

static GNU_MISSING: LazyLock<Regex> = LazyLock::new(|| {
    missing_pattern(r"cannot access '(?P<path>.+)': No such file or directory")
});
static SHORT_MISSING: LazyLock<Regex> =
    LazyLock::new(|| missing_pattern(r"^ls: (?P<path>.+): No such file or directory$"));

static LS: LazyLock<Arc<Tool>> = LazyLock::new(|| {
    Arc::new(
        Tool::new("ls")
            .fallback_flavor("bsd")
            .adapter(Adapter::new("gnu-long", parse_gnu).flavor("gnu").partial_on_error())
            .adapter(Adapter::new("bsd-long", parse_bsd).flavor("bsd").partial_on_error())
            .adapter(
                Adapter::new("busybox-long", parse_busybox).flavor("busybox").partial_on_error(),
            )
            .expected_exit_codes([1])
            .exclusive(["-l", "-1", "-C", "-x", "-m"])
            .requires_value("--sort"),
    )
});

pub fn tool() -> Arc<Tool> {
    Arc::clone(&LS)
}

/// `ls -l <path>`
pub fn long(path: impl Into<String>) -> Command {
    Command::new(tool()).with_flag("-l").with_arg(path).idempotent(true)
}

/// `ls -l --time-style=long-iso <path>` (GNU only).
pub fn long_iso(path: impl Into<String>) -> Command {
    Command::new(tool())
        .with_flag("-l")
        .with_option("--time-style", Some("long-iso"))
        .with_arg(path)
        .idempotent(true)
}

fn parse_gnu(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    parse_long(input, &GNU_ENTRY, &GNU_MISSING)
}

fn parse_bsd(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    parse_long(input, &BSD_ENTRY, &SHORT_MISSING)
}

fn parse_busybox(input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
    parse_long(input, &BUSYBOX_ENTRY, &SHORT_MISSING)
}

fn parse_long(
    input: &ParseInput<'_>,
    entry: &Regex,
    missing: &Regex,
) -> Result<ParseOutcome, ParseError> {
    let mut records = Vec::new();
    for (line_no, line) in input.lines() {
        // `total N` summaries and `dir:` headers of multi-operand listings
        if line.starts_with("total ") || (line.ends_with(':') && !entry.is_match(line)) {
            continue;
        }
        let caps = entry
            .captures(line)
            .ok_or_else(|| ParseError::malformed(line_no, "unrecognized long-format entry"))?;
        records.push(entry_record(&caps, line_no)?);
    }

    if input.exit_code != 0 {
        records.extend(input.stderr.lines().filter_map(|line| missing.captures(line)).map(
            |caps| {
                let mut rec = Record::new();
                rec.insert("missing".to_string(), FieldValue::from(&caps["path"]));
                rec
            },
        ));
    }
    Ok(ParseOutcome::records(records))
}

fn entry_record(caps: &regex::Captures<'_>, line_no: usize) -> Result<Record, ParseError> {
    let permissions = &caps["permissions"];
    let size = match &caps["size"] {
        // Device nodes print `major, minor` instead of a size
        s if s.contains(',') => FieldValue::Null,
        s => FieldValue::Int(int_field(s, line_no, "size")?),
    };
    let raw_name = &caps["name"];
    let (name, target) = match raw_name.split_once(" -> ") {
        Some((name, target)) if permissions.starts_with('l') => (name, Some(target)),
        _ => (raw_name, None),
    };

    let mut rec = cmdx_core::record! {
        "permissions" => permissions,
        "owner" => &caps["owner"],
        "group" => &caps["group"],
        "size" => size,
        "name" => name,
    };
    if let Some(target) = target {
        rec.insert("target".to_string(), FieldValue::from(target));
    }
    Ok(rec)
}

#[cfg(test)]
#[path = "ls_tests.rs"]
mod tests;
