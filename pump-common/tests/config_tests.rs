//! Tests for loading configuration from the process environment
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Every test that touches PUMP_* or LASTFM_* variables is marked #[serial].

use pump_common::config::{CommitMode, DbBackend, ImportConfig, TimestampPolicy};
use pump_common::Error;
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
    "PUMP_DB_BACKEND",
    "PUMP_DB_HOST",
    "PUMP_DB_USER",
    "PUMP_DB_PASSWORD",
    "PUMP_DB_NAME",
    "PUMP_PAGE_SIZE",
    "PUMP_MAX_PAGES",
    "PUMP_COMMIT_MODE",
    "PUMP_TIMESTAMP_POLICY",
    "LASTFM_API_KEY",
    "LASTFM_USER",
    "LASTFM_API_URL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_reads_all_variables() {
    clear_env();
    env::set_var("PUMP_DB_BACKEND", "postgres");
    env::set_var("PUMP_DB_HOST", "db.internal");
    env::set_var("PUMP_DB_USER", "pump");
    env::set_var("PUMP_DB_PASSWORD", "secret");
    env::set_var("PUMP_DB_NAME", "history");
    env::set_var("PUMP_PAGE_SIZE", "200");
    env::set_var("PUMP_MAX_PAGES", "5");
    env::set_var("PUMP_COMMIT_MODE", "two-phase");
    env::set_var("PUMP_TIMESTAMP_POLICY", "epoch");
    env::set_var("LASTFM_API_KEY", "abc");
    env::set_var("LASTFM_USER", "someone");
    env::set_var("LASTFM_API_URL", "http://127.0.0.1:9999/2.0/");

    let config = ImportConfig::from_env().expect("config should load");

    assert_eq!(config.database.backend, DbBackend::Postgres);
    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.user, "pump");
    assert_eq!(config.database.password, "secret");
    assert_eq!(config.database.name, "history");
    assert_eq!(config.lastfm.page_size, 200);
    assert_eq!(config.lastfm.api_key, "abc");
    assert_eq!(config.lastfm.user, "someone");
    assert_eq!(config.lastfm.api_url, "http://127.0.0.1:9999/2.0/");
    assert_eq!(config.max_pages, 5);
    assert_eq!(config.commit_mode, CommitMode::TwoPhase);
    assert_eq!(config.timestamp_policy, TimestampPolicy::Epoch);

    clear_env();
}

#[test]
#[serial]
fn test_from_env_without_credentials_fails() {
    clear_env();
    env::set_var("LASTFM_USER", "someone");

    match ImportConfig::from_env() {
        Err(Error::Config(msg)) => assert!(msg.contains("LASTFM_API_KEY")),
        other => panic!("Expected config error, got {:?}", other),
    }

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_backend() {
    clear_env();
    env::set_var("LASTFM_API_KEY", "abc");
    env::set_var("LASTFM_USER", "someone");
    env::set_var("PUMP_DB_BACKEND", "oracle");

    assert!(matches!(ImportConfig::from_env(), Err(Error::Config(_))));

    clear_env();
}
