// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loading session configuration from TOML and the environment.

use crate::prelude::*;
use serial_test::serial;

const CONFIG: &str = r#"
[settings]
timeout_ms = 200

[settings.cache]
default_ttl_ms = 5000

[tools.ls]
flavor = "gnu"
cache_ttl_ms = 1000
"#;

#[tokio::test]
#[serial]
async fn configured_timeout_bounds_execution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmdx.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = SessionConfig::load(&path).unwrap();
    let runtime = Runtime::new(config).unwrap();
    let result = runtime
        .execute(&Command::plain("sleep").with_arg("10"), &context(dir.path()))
        .await
        .unwrap();

    assert_eq!(runtime.config().settings.cache.default_ttl_ms, 5000);
    assert_eq!(runtime.config().tool("ls").and_then(|t| t.flavor.as_deref()), Some("gnu"));
    assert!(result.timed_out());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = SessionConfig::from_toml_str("[settings]\ntimeout = 5\n").unwrap_err();
    assert!(err.to_string().contains("invalid config"), "{err}");
}

#[test]
fn defaults_round_trip_through_toml() {
    let encoded = toml::to_string(&SessionConfig::default()).unwrap();
    let decoded = SessionConfig::from_toml_str(&encoded).unwrap();
    similar_asserts::assert_eq!(decoded, SessionConfig::default());
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmdx.toml");
    std::fs::write(&path, CONFIG).unwrap();

    std::env::set_var("CMDX_TIMEOUT_MS", "750");
    std::env::set_var("CMDX_STATE_DIR", dir.path());
    let config = SessionConfig::load(&path);
    std::env::remove_var("CMDX_TIMEOUT_MS");
    std::env::remove_var("CMDX_STATE_DIR");

    let config = config.unwrap();
    assert_eq!(config.settings.timeout_ms, 750);
    assert_eq!(config.state_dir().as_deref(), Some(dir.path()));
}

#[test]
#[serial]
fn malformed_environment_values_are_errors() {
    std::env::set_var("CMDX_REMOTE_ATTEMPTS", "0");
    let result = SessionConfig::from_env();
    std::env::remove_var("CMDX_REMOTE_ATTEMPTS");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("CMDX_REMOTE_ATTEMPTS"), "{err}");
}
