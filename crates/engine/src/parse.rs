// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser adapter contract.

use cmdx_core::{ParseError, Record};

/// What a parser sees of one execution.
#[derive(Debug, Clone, Copy)]
pub struct ParseInput<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub exit_code: i32,
}

impl<'a> ParseInput<'a> {
    pub fn new(stdout: &'a str, stderr: &'a str, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }

    /// Non-blank stdout lines with their 1-based line numbers.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &'a str)> {
        self.stdout
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| (idx + 1, line))
    }
}

/// Records extracted by a parser, plus an optional semantic failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<Record>,
    pub semantic_failure: Option<String>,
}

impl ParseOutcome {
    pub fn records(records: Vec<Record>) -> Self {
        Self { records, semantic_failure: None }
    }

    /// The tool reported an error in its output despite exiting 0.
    pub fn semantic_failure(message: impl Into<String>) -> Self {
        Self { records: Vec::new(), semantic_failure: Some(message.into()) }
    }
}

/// A version-specific parser. Empty stdout must yield no records, not an error.
pub type ParseFn = fn(&ParseInput<'_>) -> Result<ParseOutcome, ParseError>;

/// Split a header line into column names and check the expected ones are
/// present, returning their indices in `expected` order.
pub(crate) fn header_columns(
    header: &str,
    expected: &[&str],
) -> Result<Vec<usize>, ParseError> {
    let columns: Vec<&str> = header.split_whitespace().collect();
    expected
        .iter()
        .map(|name| {
            columns.iter().position(|c| c.eq_ignore_ascii_case(name)).ok_or_else(|| {
                ParseError::MissingHeader { expected: expected.join(" ") }
            })
        })
        .collect()
}

/// Parse an integer field, reporting the line on failure.
pub(crate) fn int_field(value: &str, line: usize, field: &str) -> Result<i64, ParseError> {
    value
        .parse::<i64>()
        .map_err(|_| ParseError::malformed(line, format!("{field} is not a number: {value:?}")))
}

/// Split off the first `n` whitespace-separated fields; the remainder is the
/// last column and may contain spaces.
pub(crate) fn split_columns(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(n);
    for _ in 0..n {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    let rest = rest.trim_end();
    (!rest.is_empty()).then_some((fields, rest))
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
