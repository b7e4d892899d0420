// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn lines_skip_blanks_and_keep_numbers() {
    let input = ParseInput::new("a\n\n  \nb\n", "", 0);
    let lines: Vec<_> = input.lines().collect();
    assert_eq!(lines, [(1, "a"), (4, "b")]);
}

#[test]
fn header_columns_are_case_insensitive() {
    let idx = header_columns("  PID USER     TIME  COMMAND", &["pid", "command"]).unwrap();
    assert_eq!(idx, [0, 3]);
}

#[test]
fn missing_header_column_names_the_expected_set() {
    let err = header_columns("PID TIME", &["PID", "USER"]).unwrap_err();
    assert_eq!(err, ParseError::MissingHeader { expected: "PID USER".to_string() });
}

#[test]
fn int_field_reports_line() {
    assert_eq!(int_field("42", 3, "size").unwrap(), 42);
    let err = int_field("4k", 3, "size").unwrap_err();
    assert!(matches!(err, ParseError::Malformed { line: 3, .. }), "{err}");
}

#[test]
fn semantic_failure_has_no_records() {
    let outcome = ParseOutcome::semantic_failure("no filesystems");
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.semantic_failure.as_deref(), Some("no filesystems"));
}

#[test]
fn split_columns_keeps_spaces_in_the_last_column() {
    let (fields, rest) = split_columns("  412     1 root  Ss   /usr/sbin/sshd -D ", 4).unwrap();
    assert_eq!(fields, ["412", "1", "root", "Ss"]);
    assert_eq!(rest, "/usr/sbin/sshd -D");
}

#[test]
fn split_columns_needs_a_last_column() {
    assert_eq!(split_columns("412 1 root Ss", 4), None);
}
