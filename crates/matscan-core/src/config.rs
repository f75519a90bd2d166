use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Upper bound on `MATSCAN_MAX_RETRIES`: a supplier fetch is retried at most once.
const MAX_FETCH_RETRIES: u32 = 1;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("MATSCAN_ENV", "development"))?;
    let log_level = or_default("MATSCAN_LOG_LEVEL", "info");
    let suppliers_path = PathBuf::from(or_default(
        "MATSCAN_SUPPLIERS_PATH",
        "./config/suppliers.yaml",
    ));

    let request_timeout_secs = parse_u64("MATSCAN_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MATSCAN_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let connect_timeout_secs = parse_u64("MATSCAN_CONNECT_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("MATSCAN_USER_AGENT", DEFAULT_USER_AGENT);

    let max_retries = parse_u32("MATSCAN_MAX_RETRIES", "1")?;
    if max_retries > MAX_FETCH_RETRIES {
        return Err(ConfigError::InvalidEnvVar {
            var: "MATSCAN_MAX_RETRIES".to_string(),
            reason: format!("at most {MAX_FETCH_RETRIES} retry is allowed, got {max_retries}"),
        });
    }
    let retry_backoff_ms = parse_u64("MATSCAN_RETRY_BACKOFF_MS", "250")?;

    Ok(AppConfig {
        env,
        log_level,
        suppliers_path,
        request_timeout_secs,
        connect_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MATSCAN_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
