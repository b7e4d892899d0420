// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX shell quoting.
//!
//! Words made only of characters with no special meaning to `sh` are left
//! bare; everything else is single-quoted, with embedded single quotes
//! written as `'\''`.

use std::borrow::Cow;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ',' | '+' | '@' | '%')
}

/// True when `word` must be quoted to survive the shell unchanged.
pub fn needs_quoting(word: &str) -> bool {
    word.is_empty() || !word.chars().all(is_safe)
}

/// Escape single quotes for use inside a single-quoted string
pub fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', "'\\''")
}

/// Quote one word for `sh`.
pub fn quote(word: &str) -> Cow<'_, str> {
    if needs_quoting(word) {
        Cow::Owned(format!("'{}'", escape_single_quotes(word)))
    } else {
        Cow::Borrowed(word)
    }
}

/// Render a program and its arguments as one shell command line.
pub fn render<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = quote(program).into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg.as_ref()));
    }
    line
}

#[cfg(test)]
#[path = "quote_tests.rs"]
mod tests;
