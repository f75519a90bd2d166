use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MATSCAN_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.suppliers_path.to_string_lossy(),
        "./config/suppliers.yaml"
    );
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.connect_timeout_secs, 10);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.max_retries, 1);
    assert_eq!(cfg.retry_backoff_ms, 250);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("MATSCAN_ENV", "production");
    map.insert("MATSCAN_LOG_LEVEL", "debug");
    map.insert("MATSCAN_SUPPLIERS_PATH", "/etc/matscan/suppliers.yaml");
    map.insert("MATSCAN_REQUEST_TIMEOUT_SECS", "12");
    map.insert("MATSCAN_USER_AGENT", "matscan-test/0.1");
    map.insert("MATSCAN_MAX_RETRIES", "0");
    map.insert("MATSCAN_RETRY_BACKOFF_MS", "50");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.log_level, "debug");
    assert_eq!(
        cfg.suppliers_path.to_string_lossy(),
        "/etc/matscan/suppliers.yaml"
    );
    assert_eq!(cfg.request_timeout_secs, 12);
    assert_eq!(cfg.user_agent, "matscan-test/0.1");
    assert_eq!(cfg.max_retries, 0);
    assert_eq!(cfg.retry_backoff_ms, 50);
}

#[test]
fn build_app_config_rejects_invalid_request_timeout() {
    let mut map = HashMap::new();
    map.insert("MATSCAN_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MATSCAN_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MATSCAN_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_request_timeout() {
    let mut map = HashMap::new();
    map.insert("MATSCAN_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MATSCAN_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MATSCAN_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_more_than_one_retry() {
    let mut map = HashMap::new();
    map.insert("MATSCAN_MAX_RETRIES", "3");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MATSCAN_MAX_RETRIES"),
        "expected InvalidEnvVar(MATSCAN_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_backoff() {
    let mut map = HashMap::new();
    map.insert("MATSCAN_RETRY_BACKOFF_MS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MATSCAN_RETRY_BACKOFF_MS"),
        "expected InvalidEnvVar(MATSCAN_RETRY_BACKOFF_MS), got: {result:?}"
    );
}
