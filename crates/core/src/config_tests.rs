// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::time::Duration;

#[test]
fn defaults_match_documented_values() {
    let config = SessionConfig::default();
    assert_eq!(config.settings.timeout(), Duration::from_secs(30));
    assert_eq!(config.settings.cache.default_ttl(), Duration::from_secs(60));
    assert_eq!(config.settings.remote.connect_attempts, 3);
    assert_eq!(config.settings.remote.backoff(), Duration::from_millis(200));
    assert_eq!(config.settings.remote.max_sessions_per_host, 4);
    assert!(config.tools.is_empty());
}

#[test]
fn empty_toml_is_default() {
    assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
}

#[test]
fn default_config_round_trips_through_toml() {
    let config = SessionConfig::default();
    let text = toml::to_string(&config).unwrap();
    assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn parses_sections_and_tool_table() {
    let config = SessionConfig::from_toml_str(
        r#"
        [settings]
        timeout_ms = 5000

        [settings.cache]
        default_ttl_ms = 1000
        dir = "/tmp/cmdx-cache"

        [settings.remote]
        max_sessions_per_host = 2

        [tools.ls]
        flavor = "gnu"
        version = "9.4"
        cache_ttl_ms = 250
        "#,
    )
    .unwrap();

    assert_eq!(config.settings.timeout(), Duration::from_secs(5));
    assert_eq!(config.settings.cache.dir.as_deref(), Some(Path::new("/tmp/cmdx-cache")));
    assert_eq!(config.settings.remote.max_sessions_per_host, 2);
    // Unspecified remote fields keep their defaults
    assert_eq!(config.settings.remote.connect_attempts, 3);

    let ls = config.tool("ls").unwrap();
    assert_eq!(ls.flavor.as_deref(), Some("gnu"));
    assert_eq!(ls.pinned_version(), Some(Version::new(9, 4, 0)));
    assert_eq!(ls.cache_ttl(), Some(Duration::from_millis(250)));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = SessionConfig::from_toml_str("[settings]\ntimeout = 5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
#[serial]
fn load_applies_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmdx.toml");
    std::fs::write(&path, "[settings]\ntimeout_ms = 5000\n").unwrap();

    std::env::set_var(crate::env::TIMEOUT_MS, "750");
    let config = SessionConfig::load(&path);
    std::env::remove_var(crate::env::TIMEOUT_MS);

    assert_eq!(config.unwrap().settings.timeout_ms, 750);
}

#[test]
fn load_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
