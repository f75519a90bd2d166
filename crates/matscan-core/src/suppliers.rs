//! Supplier profiles and search settings loaded from `config/suppliers.yaml`.
//!
//! The file is read once at startup and is read-only afterwards. Everything a
//! query needs to know about a supplier (how to build requests, where product
//! nodes live in the response) is declared here rather than in code.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::{Category, Currency};
use crate::ConfigError;

/// Placeholder replaced with the percent-encoded search terms.
pub const QUERY_PLACEHOLDER: &str = "{query}";
/// Placeholder replaced with the 1-based page number.
pub const PAGE_PLACEHOLDER: &str = "{page}";
/// Upper bound on pages per search-endpoint supplier.
pub const MAX_SEARCH_PAGES: u32 = 10;

const DEFAULT_BRANDS: &[&str] = &[
    "Kingspan",
    "Celotex",
    "Recticel",
    "Ecotherm",
    "Xtratherm",
    "Unilin",
    "Rockwool",
    "Knauf",
    "Isover",
    "Superglass",
    "British Gypsum",
    "Gyproc",
    "Siniat",
    "Knauf Insulation",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    #[default]
    Get,
    /// Form-encoded POST built from the strategy's `form` map.
    Post,
}

/// CSS selectors for an HTML listing page. Each field lists selectors in
/// priority order; the first one that yields a value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlLayout {
    /// Product node selectors. The first selector with any match is used for
    /// the whole page.
    pub containers: Vec<String>,
    pub title: Vec<String>,
    /// Price selectors. When the matched element has no text, the
    /// `data-price` and `content` attributes are read instead.
    pub price: Vec<String>,
    #[serde(default = "default_link_selectors")]
    pub link: Vec<String>,
    #[serde(default = "default_image_selectors")]
    pub image: Vec<String>,
    #[serde(default)]
    pub sku: Vec<String>,
}

/// Dotted field paths for a JSON search API, e.g. `"data.products"` or
/// `"price.formatted"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonLayout {
    /// Path to the product array. Empty means the document root.
    #[serde(default)]
    pub items: String,
    pub title: String,
    pub price: String,
    pub link: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum NodeLayout {
    Html(HtmlLayout),
    Json(JsonLayout),
}

/// Keyword search: the query is substituted into a URL template or form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEndpointConfig {
    /// URL template; may contain `{query}` and `{page}`.
    pub search_url: String,
    #[serde(default)]
    pub method: FetchMethod,
    /// Form fields for `POST`; values may contain `{query}` and `{page}`.
    #[serde(default)]
    pub form: BTreeMap<String, String>,
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Query-string parameter carrying the page number when the template
    /// has no `{page}` placeholder.
    #[serde(default)]
    pub page_param: Option<String>,
    /// Categories this supplier stocks. Empty means any.
    #[serde(default)]
    pub categories: Vec<Category>,
    pub layout: NodeLayout,
}

/// One fixed category page on a supplier's site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub url: String,
    pub category: Category,
    /// Board thickness this page lists, when the site splits pages by
    /// thickness.
    #[serde(default)]
    pub thickness_mm: Option<Decimal>,
    /// Extra words that select this route, e.g. `["celotex", "cavity"]`.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Category navigation: query hints are mapped onto fixed category pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNavigationConfig {
    pub routes: Vec<RouteConfig>,
    /// Cap on pages requested when the mapping is ambiguous.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    pub layout: NodeLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    SearchEndpoint(SearchEndpointConfig),
    CategoryNavigation(CategoryNavigationConfig),
}

impl StrategyConfig {
    #[must_use]
    pub fn layout(&self) -> &NodeLayout {
        match self {
            StrategyConfig::SearchEndpoint(cfg) => &cfg.layout,
            StrategyConfig::CategoryNavigation(cfg) => &cfg.layout,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::SearchEndpoint(_) => "search_endpoint",
            StrategyConfig::CategoryNavigation(_) => "category_navigation",
        }
    }
}

/// A supplier website and the strategy bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierProfile {
    /// Stable identifier, e.g. `"insulation4less"` or `"diy.com"`.
    pub id: String,
    pub name: String,
    pub website: String,
    /// Delivery coverage as advertised, e.g. `"All UK"`.
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides `per_supplier_timeout_ms` for this supplier.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Currency assumed when price text carries no symbol.
    #[serde(default)]
    pub currency: Currency,
    pub strategy: StrategyConfig,
}

/// Inclusive sane price band for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }

    /// Built-in band used when the config file does not name a category.
    #[must_use]
    pub fn default_for(category: Category) -> Self {
        let (min, max) = match category {
            Category::PirInsulation => (Decimal::new(100, 2), Decimal::new(400, 0)),
            Category::MineralWool => (Decimal::new(100, 2), Decimal::new(250, 0)),
            Category::Plasterboard => (Decimal::new(100, 2), Decimal::new(150, 0)),
            Category::Other => (Decimal::new(50, 2), Decimal::new(1000, 0)),
        };
        Self { min, max }
    }
}

/// Search settings plus the supplier list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,
    #[serde(default = "default_per_supplier_timeout_ms")]
    pub per_supplier_timeout_ms: u64,
    /// Result count when the query does not ask for one.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Hard cap on the result count a query may request.
    #[serde(default = "default_max_results_limit")]
    pub max_results_limit: usize,
    /// Minimum relevance score. A zero score is never kept, so `0.0` means
    /// "at least one core query term must match".
    #[serde(default)]
    pub min_relevance: f64,
    #[serde(default = "default_max_nodes_per_page")]
    pub max_nodes_per_page: usize,
    /// Currency results are compared in. Price bounds and the max-price
    /// hint are read in this currency, and listings priced in any other
    /// currency are rejected.
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub price_bounds: BTreeMap<Category, PriceBounds>,
    #[serde(default = "default_brands")]
    pub brands: Vec<String>,
    pub suppliers: Vec<SupplierProfile>,
}

impl SearchConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SuppliersFileParse`] for malformed YAML and
    /// [`ConfigError::Validation`] for semantically invalid settings.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    #[must_use]
    pub fn supplier_timeout(&self, profile: &SupplierProfile) -> Duration {
        Duration::from_millis(profile.timeout_ms.unwrap_or(self.per_supplier_timeout_ms))
    }

    /// Configured band for `category`, falling back to the built-in default.
    #[must_use]
    pub fn bounds_for(&self, category: Category) -> PriceBounds {
        self.price_bounds
            .get(&category)
            .copied()
            .unwrap_or_else(|| PriceBounds::default_for(category))
    }

    /// Result count for a query: the requested count (or the default),
    /// never above `max_results_limit`.
    #[must_use]
    pub fn effective_max_results(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_results)
            .clamp(1, self.max_results_limit)
    }

    pub fn enabled_suppliers(&self) -> impl Iterator<Item = &SupplierProfile> {
        self.suppliers.iter().filter(|s| s.enabled)
    }

    /// Checks cross-field invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.overall_timeout_ms == 0 {
            return Err(validation("overall_timeout_ms must be greater than zero"));
        }
        if self.per_supplier_timeout_ms == 0
            || self.per_supplier_timeout_ms >= self.overall_timeout_ms
        {
            return Err(validation(format!(
                "per_supplier_timeout_ms ({}) must be non-zero and shorter than overall_timeout_ms ({})",
                self.per_supplier_timeout_ms, self.overall_timeout_ms
            )));
        }
        if self.max_results == 0 || self.max_results_limit == 0 {
            return Err(validation("max_results and max_results_limit must be at least 1"));
        }
        if self.max_results > self.max_results_limit {
            return Err(validation(format!(
                "max_results ({}) exceeds max_results_limit ({})",
                self.max_results, self.max_results_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(validation(format!(
                "min_relevance must be within [0, 1], got {}",
                self.min_relevance
            )));
        }
        if self.max_nodes_per_page == 0 {
            return Err(validation("max_nodes_per_page must be at least 1"));
        }
        for (category, bounds) in &self.price_bounds {
            if bounds.min.is_sign_negative() || bounds.min > bounds.max {
                return Err(validation(format!(
                    "price_bounds for {category}: require 0 <= min <= max, got {}..{}",
                    bounds.min, bounds.max
                )));
            }
        }

        if self.enabled_suppliers().next().is_none() {
            return Err(validation("at least one supplier must be enabled"));
        }

        let mut seen_ids = HashSet::new();
        for supplier in &self.suppliers {
            validate_supplier(supplier, self.overall_timeout_ms)?;
            if !seen_ids.insert(supplier.id.as_str()) {
                return Err(validation(format!(
                    "duplicate supplier id: '{}'",
                    supplier.id
                )));
            }
        }

        Ok(())
    }
}

/// Load and validate the search configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_search_config(path: &Path) -> Result<SearchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SuppliersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    SearchConfig::from_yaml_str(&content)
}

fn validate_supplier(supplier: &SupplierProfile, overall_timeout_ms: u64) -> Result<(), ConfigError> {
    let id = &supplier.id;
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return Err(validation(format!(
            "supplier id '{id}' must be non-empty and use only a-z, 0-9, '-', '_' or '.'"
        )));
    }
    if supplier.name.trim().is_empty() {
        return Err(validation(format!("supplier '{id}' has an empty name")));
    }
    require_http_url(id, "website", &supplier.website)?;
    if let Some(timeout_ms) = supplier.timeout_ms {
        if timeout_ms == 0 || timeout_ms >= overall_timeout_ms {
            return Err(validation(format!(
                "supplier '{id}' timeout_ms ({timeout_ms}) must be non-zero and shorter than overall_timeout_ms ({overall_timeout_ms})"
            )));
        }
    }

    match &supplier.strategy {
        StrategyConfig::SearchEndpoint(cfg) => {
            require_http_url(id, "search_url", &cfg.search_url)?;
            let in_url = cfg.search_url.contains(QUERY_PLACEHOLDER);
            let in_form = cfg.form.values().any(|v| v.contains(QUERY_PLACEHOLDER));
            if !in_url && !in_form {
                return Err(validation(format!(
                    "supplier '{id}': search_endpoint needs {QUERY_PLACEHOLDER} in search_url or a form value"
                )));
            }
            if cfg.method == FetchMethod::Get && !cfg.form.is_empty() {
                return Err(validation(format!(
                    "supplier '{id}': form fields require method: post"
                )));
            }
            if cfg.pages == 0 || cfg.pages > MAX_SEARCH_PAGES {
                return Err(validation(format!(
                    "supplier '{id}': pages must be between 1 and {MAX_SEARCH_PAGES}"
                )));
            }
            let has_page_slot = cfg.search_url.contains(PAGE_PLACEHOLDER)
                || cfg.form.values().any(|v| v.contains(PAGE_PLACEHOLDER))
                || cfg.page_param.is_some();
            if cfg.pages > 1 && !has_page_slot {
                return Err(validation(format!(
                    "supplier '{id}': pages > 1 requires page_param or a {PAGE_PLACEHOLDER} placeholder"
                )));
            }
        }
        StrategyConfig::CategoryNavigation(cfg) => {
            if cfg.routes.is_empty() {
                return Err(validation(format!(
                    "supplier '{id}': category_navigation needs at least one route"
                )));
            }
            if cfg.max_requests == 0 {
                return Err(validation(format!(
                    "supplier '{id}': max_requests must be at least 1"
                )));
            }
            for route in &cfg.routes {
                require_http_url(id, "route url", &route.url)?;
                if route.thickness_mm.is_some_and(|t| t <= Decimal::ZERO) {
                    return Err(validation(format!(
                        "supplier '{id}': route thickness_mm must be positive ({})",
                        route.url
                    )));
                }
            }
        }
    }

    match supplier.strategy.layout() {
        NodeLayout::Html(layout) => {
            if layout.containers.is_empty() || layout.title.is_empty() || layout.price.is_empty() {
                return Err(validation(format!(
                    "supplier '{id}': html layout needs containers, title and price selectors"
                )));
            }
        }
        NodeLayout::Json(layout) => {
            if layout.title.is_empty() || layout.price.is_empty() || layout.link.is_empty() {
                return Err(validation(format!(
                    "supplier '{id}': json layout needs title, price and link paths"
                )));
            }
        }
    }

    Ok(())
}

fn require_http_url(id: &str, field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(validation(format!(
            "supplier '{id}': {field} must be an http(s) URL, got '{url}'"
        )))
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

fn default_link_selectors() -> Vec<String> {
    vec!["a[href]".to_string()]
}

fn default_image_selectors() -> Vec<String> {
    vec!["img".to_string()]
}

fn default_pages() -> u32 {
    1
}

fn default_max_requests() -> usize {
    4
}

fn default_enabled() -> bool {
    true
}

fn default_overall_timeout_ms() -> u64 {
    20_000
}

fn default_per_supplier_timeout_ms() -> u64 {
    10_000
}

fn default_max_results() -> usize {
    10
}

fn default_max_results_limit() -> usize {
    20
}

fn default_max_nodes_per_page() -> usize {
    200
}

fn default_brands() -> Vec<String> {
    DEFAULT_BRANDS.iter().map(|b| (*b).to_string()).collect()
}

#[cfg(test)]
#[path = "suppliers_test.rs"]
mod tests;
