// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const TIMEOUT_MS: &str = "CMDX_TIMEOUT_MS";
pub const CACHE_TTL_MS: &str = "CMDX_CACHE_TTL_MS";
pub const REMOTE_ATTEMPTS: &str = "CMDX_REMOTE_ATTEMPTS";
pub const STATE_DIR: &str = "CMDX_STATE_DIR";

/// Default execution timeout override.
pub fn timeout_ms() -> Result<Option<u64>, ConfigError> {
    parse_var(TIMEOUT_MS)
}

/// Default cache TTL override.
pub fn cache_ttl_ms() -> Result<Option<u64>, ConfigError> {
    parse_var(CACHE_TTL_MS)
}

/// Remote connect attempts override. Zero is rejected.
pub fn remote_attempts() -> Result<Option<u32>, ConfigError> {
    match parse_var::<u32>(REMOTE_ATTEMPTS)? {
        Some(0) => Err(ConfigError::Env { var: REMOTE_ATTEMPTS, value: "0".to_string() }),
        other => Ok(other),
    }
}

pub fn state_dir_override() -> Option<PathBuf> {
    std::env::var(STATE_DIR).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Resolve state directory: CMDX_STATE_DIR > platform state dir/cmdx > ~/.local/state/cmdx
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = state_dir_override() {
        return Some(dir);
    }
    if let Some(dir) = dirs::state_dir() {
        return Some(dir.join("cmdx"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/cmdx"))
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => {
            value.trim().parse::<T>().map(Some).map_err(|_| ConfigError::Env { var, value })
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
