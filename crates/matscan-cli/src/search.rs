//! `matscan search`: run one query and print the ranked result.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use matscan_core::{AppConfig, Query, QueryHints, SearchResult, SupplierStatus};
use matscan_scraper::{FetchSettings, QueryOrchestrator, ReqwestFetcher};

/// Loads the suppliers file, runs `text` against every supplier and prints
/// the result as a table or JSON.
///
/// # Errors
///
/// Returns an error if the query is invalid, the suppliers file cannot be
/// loaded or the orchestrator cannot be built. Supplier failures are
/// reported in the output, not returned.
pub(crate) async fn run_search(
    config: &AppConfig,
    text: &str,
    hints: QueryHints,
    json: bool,
) -> anyhow::Result<()> {
    let query = Query::with_hints(text, hints)?;
    let search_config = matscan_core::load_search_config(&config.suppliers_path)
        .with_context(|| format!("loading {}", config.suppliers_path.display()))?;
    let fetcher = ReqwestFetcher::from_app_config(config)?;
    let orchestrator = QueryOrchestrator::new(
        search_config,
        FetchSettings::from_app_config(config),
        Arc::new(fetcher),
    )?;

    let result = orchestrator.run_query(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_table(&result));
    }
    Ok(())
}

/// Human-readable rendering: products first, then one line per supplier.
pub(crate) fn render_table(result: &SearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\"{}\": {} of {} candidates in {}ms",
        result.query,
        result.products.len(),
        result.total_candidates,
        result.elapsed_ms
    );

    if result.is_empty() {
        let _ = writeln!(out, "\nno matching products");
    } else {
        let _ = writeln!(out);
        for (rank, product) in result.products.iter().enumerate() {
            let annotation = product
                .price_annotation
                .as_deref()
                .map(|a| format!(" ({a})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:>2}. {:>9}{annotation}  {}  [{}]",
                rank + 1,
                product.price.to_string(),
                product.name,
                product.supplier_id
            );
            let _ = writeln!(out, "    {}", product.url);
        }
    }

    let _ = writeln!(out, "\nsuppliers:");
    for report in &result.suppliers {
        let detail = match report.status {
            SupplierStatus::Ok => format!("{} products", report.product_count),
            _ => report.message.clone().unwrap_or_default(),
        };
        let _ = writeln!(
            out,
            "  {:<28} {:<9} {:>6}ms  {detail}",
            report.supplier_id,
            report.status.as_str(),
            report.elapsed_ms
        );
    }
    out
}
