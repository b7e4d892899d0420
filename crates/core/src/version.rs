// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool versions and the adapter they resolve to.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("constant regex pattern is valid")
});

/// A `major.minor.patch` version tuple. Missing components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Find the first `N.N[.N]` token in free-form `--version` output.
    pub fn find_in(text: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(text)?;
        let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        Some(Self::new(part(1)?, part(2)?, part(3).unwrap_or(0)))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = |required: bool| -> Result<u32, String> {
            match parts.next() {
                Some(p) => p.parse::<u32>().map_err(|_| format!("invalid version {s:?}")),
                None if required => Err(format!("invalid version {s:?}")),
                None => Ok(0),
            }
        };
        let version = Self::new(next(true)?, next(false)?, next(false)?);
        if parts.next().is_some() {
            return Err(format!("invalid version {s:?}"));
        }
        Ok(version)
    }
}

/// Inclusive-min, exclusive-max range of supported versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub max: Option<Version>,
}

impl VersionRange {
    pub const ANY: VersionRange = VersionRange { min: None, max: None };

    pub const fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    pub const fn at_least(min: Version) -> Self {
        Self { min: Some(min), max: None }
    }

    pub const fn below(max: Version) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.min.is_none_or(|min| *version >= min) && self.max.is_none_or(|max| *version < max)
    }

    pub fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => f.write_str("any"),
            (Some(min), None) => write!(f, ">={min}"),
            (None, Some(max)) => write!(f, "<{max}"),
            (Some(min), Some(max)) => write!(f, ">={min}, <{max}"),
        }
    }
}

/// What the version service learned about a tool on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub tool: String,
    pub version: Option<Version>,
    /// Implementation family (`gnu`, `bsd`, `busybox`, `procps`, ...).
    pub flavor: Option<String>,
    /// The parser adapter selected for this version, if any matched.
    pub adapter: Option<String>,
}

impl VersionInfo {
    /// Nothing could be determined; parsing falls back to raw-only.
    pub fn unknown(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), version: None, flavor: None, adapter: None }
    }

    /// Identifier that goes into cache keys. Two results parsed by different
    /// adapters or versions never share a cache entry.
    pub fn id(&self) -> String {
        let version = self.version.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
        let flavor = self.flavor.as_deref().unwrap_or("?");
        let adapter = self.adapter.as_deref().unwrap_or("raw");
        format!("{}@{}-{}:{}", self.tool, flavor, version, adapter)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
