// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured records extracted from tool output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single scalar field in a parsed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Ordered field → value mapping. Field order follows the tool's column order.
pub type Record = IndexMap<String, FieldValue>;

/// Build a [`Record`] from `(field, value)` pairs.
///
/// ```ignore
/// let rec = cmdx_core::record! { "name" => "file1.txt", "size" => 1024i64 };
/// ```
#[macro_export]
macro_rules! record {
    ($( $key:expr => $value:expr ),* $(,)?) => {{
        let mut rec = $crate::Record::new();
        $( rec.insert(String::from($key), $crate::FieldValue::from($value)); )*
        rec
    }};
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
