//! `matscan suppliers` and `matscan check-config`.

use std::sync::Arc;

use anyhow::Context;
use matscan_core::{AppConfig, SearchConfig};
use matscan_scraper::{FetchSettings, QueryOrchestrator, ReqwestFetcher};

fn load(config: &AppConfig) -> anyhow::Result<SearchConfig> {
    matscan_core::load_search_config(&config.suppliers_path)
        .with_context(|| format!("loading {}", config.suppliers_path.display()))
}

/// Prints the supplier directory.
pub(crate) fn list_suppliers(config: &AppConfig) -> anyhow::Result<()> {
    let search_config = load(config)?;
    for supplier in &search_config.suppliers {
        let state = if supplier.enabled { "" } else { " (disabled)" };
        println!(
            "{:<28} {}{state}\n    {}  strategy: {}  delivery: {}",
            supplier.id,
            supplier.name,
            supplier.website,
            supplier.strategy.kind(),
            supplier.delivery.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

/// Loads and validates the suppliers file and compiles every enabled
/// supplier's selectors, exactly as a search would at startup.
pub(crate) fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    let search_config = load(config)?;
    let total = search_config.suppliers.len();
    let enabled = search_config.enabled_suppliers().count();
    let fetcher = ReqwestFetcher::from_app_config(config)?;
    QueryOrchestrator::new(
        search_config,
        FetchSettings::from_app_config(config),
        Arc::new(fetcher),
    )?;
    tracing::info!(total, enabled, "suppliers file is valid");
    println!(
        "{}: {total} suppliers ({enabled} enabled), all selectors compile",
        config.suppliers_path.display()
    );
    Ok(())
}
