// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session configuration: runtime settings plus the tool-version table.
//!
//! ```toml
//! [settings]
//! timeout_ms = 30000
//!
//! [settings.cache]
//! default_ttl_ms = 60000
//! dir = "/var/cache/cmdx"
//!
//! [settings.remote]
//! max_sessions_per_host = 4
//!
//! [tools.ls]
//! flavor = "gnu"
//! cache_ttl_ms = 5000
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub settings: Settings,
    pub tools: BTreeMap<String, ToolSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default bound on one backend execution.
    pub timeout_ms: u64,
    pub cache: CacheSettings,
    pub remote: RemoteSettings,
    /// Where the audit log lives. Defaults to [`crate::env::state_dir`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Append a JSONL record per execution.
    pub audit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            cache: CacheSettings::default(),
            remote: RemoteSettings::default(),
            state_dir: None,
            audit: false,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub enabled: bool,
    pub default_ttl_ms: u64,
    /// Persist entries under this directory. In-memory only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true, default_ttl_ms: 60_000, dir: None }
    }
}

impl CacheSettings {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSettings {
    pub max_sessions_per_host: usize,
    pub connect_attempts: u32,
    /// First retry delay; doubles after every failed attempt.
    pub backoff_ms: u64,
    pub connect_timeout_ms: u64,
    /// Idle sessions older than this are health-probed before reuse.
    pub probe_after_idle_ms: u64,
    /// Passed to ssh as `ControlPersist`.
    pub control_persist_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            max_sessions_per_host: 4,
            connect_attempts: 3,
            backoff_ms: 200,
            connect_timeout_ms: 10_000,
            probe_after_idle_ms: 60_000,
            control_persist_secs: 300,
        }
    }
}

impl RemoteSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_after_idle(&self) -> Duration {
        Duration::from_millis(self.probe_after_idle_ms)
    }
}

/// Per-tool entry of the tool-version table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    /// Pin the flavor instead of sniffing `--version` output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    /// Pin the version instead of running detection at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_ms: Option<u64>,
}

impl ToolSettings {
    pub fn pinned_version(&self) -> Option<Version> {
        self.version.as_deref().and_then(|v| v.parse().ok())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_ms.map(Duration::from_millis)
    }
}

impl SessionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML file, then apply `CMDX_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)?.with_env_overrides()
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(ms) = crate::env::timeout_ms()? {
            self.settings.timeout_ms = ms;
        }
        if let Some(ms) = crate::env::cache_ttl_ms()? {
            self.settings.cache.default_ttl_ms = ms;
        }
        if let Some(attempts) = crate::env::remote_attempts()? {
            self.settings.remote.connect_attempts = attempts;
        }
        if let Some(dir) = crate::env::state_dir_override() {
            self.settings.state_dir = Some(dir);
        }
        Ok(self)
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSettings> {
        self.tools.get(name)
    }

    /// Directory for the audit log: configured, or the platform default.
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.settings.state_dir.clone().or_else(crate::env::state_dir)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
