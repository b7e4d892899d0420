// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool declarations: how a program is detected, which parser adapters it
//! has, and how its options and exit codes are interpreted.

use std::time::Duration;

use cmdx_core::{ExitClass, InvocationError, ParseError, Version, VersionRange};

use crate::parse::{ParseFn, ParseInput, ParseOutcome};

/// One entry of a tool's parser table.
#[derive(Debug, Clone)]
pub struct Adapter {
    id: String,
    flavor: Option<String>,
    versions: VersionRange,
    partial_on_error: bool,
    parse: ParseFn,
}

impl Adapter {
    pub fn new(id: impl Into<String>, parse: ParseFn) -> Self {
        Self {
            id: id.into(),
            flavor: None,
            versions: VersionRange::ANY,
            partial_on_error: false,
            parse,
        }
    }

    /// Only match tools of this implementation family.
    pub fn flavor(mut self, flavor: impl Into<String>) -> Self {
        self.flavor = Some(flavor.into());
        self
    }

    /// Only match versions inside `range`. A bounded range never matches an
    /// unknown version.
    pub fn versions(mut self, range: VersionRange) -> Self {
        self.versions = range;
        self
    }

    /// Run the parser on nonzero exits too, to extract records from error
    /// output.
    pub fn partial_on_error(mut self) -> Self {
        self.partial_on_error = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parses_errors(&self) -> bool {
        self.partial_on_error
    }

    pub fn matches(&self, version: Option<&Version>, flavor: Option<&str>) -> bool {
        let flavor_ok = match &self.flavor {
            Some(wanted) => flavor == Some(wanted.as_str()),
            None => true,
        };
        let version_ok =
            self.versions.is_any() || version.is_some_and(|v| self.versions.contains(v));
        flavor_ok && version_ok
    }

    pub fn parse(&self, input: &ParseInput<'_>) -> Result<ParseOutcome, ParseError> {
        (self.parse)(input)
    }
}

#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    detect_args: Vec<String>,
    fallback_flavor: Option<String>,
    adapters: Vec<Adapter>,
    expected_exit_codes: Vec<i32>,
    exclusive: Vec<Vec<String>>,
    value_flags: Vec<String>,
    cache_ttl: Option<Duration>,
}

impl Tool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detect_args: vec!["--version".to_string()],
            fallback_flavor: None,
            adapters: Vec::new(),
            expected_exit_codes: Vec::new(),
            exclusive: Vec::new(),
            value_flags: Vec::new(),
            cache_ttl: None,
        }
    }

    /// Arguments that make the tool print its version.
    pub fn detect_with<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.detect_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Flavor assumed when detection prints no version but the tool exists
    /// (BSD `ls` rejects `--version`).
    pub fn fallback_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.fallback_flavor = Some(flavor.into());
        self
    }

    /// Append a parser adapter. Adapters are tried in declaration order.
    pub fn adapter(mut self, adapter: Adapter) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Nonzero exit codes that are an ordinary outcome for this tool.
    pub fn expected_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.expected_exit_codes.extend(codes);
        self
    }

    /// Declare a group of mutually exclusive flags.
    pub fn exclusive<S: Into<String>>(mut self, flags: impl IntoIterator<Item = S>) -> Self {
        self.exclusive.push(flags.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a flag that must carry a value.
    pub fn requires_value(mut self, flag: impl Into<String>) -> Self {
        self.value_flags.push(flag.into());
        self
    }

    /// Cache TTL for this tool, overriding configuration.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detect_args(&self) -> &[String] {
        &self.detect_args
    }

    pub fn default_flavor(&self) -> Option<&str> {
        self.fallback_flavor.as_deref()
    }

    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    pub fn ttl_override(&self) -> Option<Duration> {
        self.cache_ttl
    }

    /// A tool without parser adapters. Its output is always raw and its
    /// version is never detected.
    pub fn is_plain(&self) -> bool {
        self.adapters.is_empty()
    }

    /// First adapter matching what is known about the installed tool. With
    /// neither a version nor a flavor there is nothing to match on.
    pub fn select(&self, version: Option<&Version>, flavor: Option<&str>) -> Option<&Adapter> {
        if version.is_none() && flavor.is_none() {
            return None;
        }
        self.adapters.iter().find(|a| a.matches(version, flavor))
    }

    pub fn adapter_by_id(&self, id: &str) -> Option<&Adapter> {
        self.adapters.iter().find(|a| a.id == id)
    }

    pub fn classify_exit(&self, code: i32) -> ExitClass {
        match code {
            0 => ExitClass::Success,
            c if self.expected_exit_codes.contains(&c) => ExitClass::Expected,
            _ => ExitClass::Failed,
        }
    }

    /// Validate option constraints for a set of flags, in declaration order.
    pub(crate) fn check_options<'a>(
        &self,
        options: impl Iterator<Item = (&'a str, Option<&'a str>)> + Clone,
    ) -> Result<(), InvocationError> {
        for (flag, value) in options.clone() {
            if value.is_none() && self.value_flags.iter().any(|f| f == flag) {
                return Err(InvocationError::MissingValue {
                    tool: self.name.clone(),
                    flag: flag.to_string(),
                });
            }
        }
        for group in &self.exclusive {
            let mut present =
                options.clone().map(|(flag, _)| flag).filter(|f| group.iter().any(|g| g == f));
            let Some(first) = present.next() else { continue };
            if let Some(second) = present.find(|f| *f != first) {
                return Err(InvocationError::ConflictingOptions {
                    tool: self.name.clone(),
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
