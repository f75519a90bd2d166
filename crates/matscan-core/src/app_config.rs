use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings read from the environment.
///
/// Search behaviour (suppliers, timeouts, bounds) lives in the YAML
/// [`crate::SearchConfig`] pointed to by `suppliers_path`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub suppliers_path: PathBuf,
    /// Hard ceiling applied to every outbound request, regardless of the
    /// per-supplier budget.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Retries after the first failed fetch. Only `0` or `1` are accepted.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}
