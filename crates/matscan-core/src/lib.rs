pub mod app_config;
pub mod config;
pub mod products;
pub mod query;
pub mod suppliers;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    Category, Currency, Money, PipelineCounts, Product, SearchResult, SupplierReport,
    SupplierStatus,
};
pub use query::{Query, QueryError, QueryHints};
pub use suppliers::{
    load_search_config, CategoryNavigationConfig, FetchMethod, HtmlLayout, JsonLayout,
    NodeLayout, PriceBounds, RouteConfig, SearchConfig, SearchEndpointConfig, StrategyConfig,
    SupplierProfile, PAGE_PLACEHOLDER, QUERY_PLACEHOLDER,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read suppliers file {path}: {source}")]
    SuppliersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suppliers file: {0}")]
    SuppliersFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
