//! One supplier branch of a query: fetch, locate, extract, normalize, score.

use matscan_core::{PipelineCounts, Product, Query, SearchConfig, SupplierProfile, SupplierStatus};
use tokio::time::Instant;

use crate::client::{fetch_checked, HttpFetcher};
use crate::error::ScraperError;
use crate::extract::{extract_listings, PageContext};
use crate::normalize::{normalize_listing, NormalizeContext};
use crate::relevance::{passes, score, QueryTerms};
use crate::strategy::Strategy;
use crate::types::{FetchResponse, FetchSpec};

use super::FetchSettings;

/// Query-wide inputs shared by every supplier branch.
pub(super) struct BranchContext<'a> {
    pub config: &'a SearchConfig,
    pub query: &'a Query,
    pub terms: &'a QueryTerms,
    pub settings: FetchSettings,
    /// Earliest of the supplier and overall deadlines.
    pub deadline: Instant,
}

#[derive(Debug)]
pub(super) struct BranchOutcome {
    pub status: SupplierStatus,
    pub products: Vec<Product>,
    pub counts: PipelineCounts,
    pub message: Option<String>,
}

/// Runs every request for one supplier and turns the pages into scored
/// products.
///
/// Pages are fetched concurrently. A page that fails to fetch or parse is
/// counted and the rest still contribute; the branch only ends in `error`
/// (or `timed-out`) when no page succeeded.
pub(super) async fn run_branch<F: HttpFetcher>(
    fetcher: &F,
    profile: &SupplierProfile,
    strategy: &Strategy,
    requests: &[FetchSpec],
    ctx: &BranchContext<'_>,
) -> BranchOutcome {
    let fetches = requests.iter().map(|spec| {
        fetch_checked(
            fetcher,
            spec,
            ctx.deadline,
            ctx.settings.request_ceiling,
            ctx.settings.retry,
        )
    });
    let responses = futures::future::join_all(fetches).await;

    let mut counts = PipelineCounts::default();
    let mut products = Vec::new();
    let mut failures: Vec<ScraperError> = Vec::new();

    for (spec, response) in requests.iter().zip(responses) {
        let page = response.and_then(|resp| {
            process_page(profile, strategy, spec, &resp, ctx, &mut counts)
        });
        match page {
            Ok(mut page_products) => {
                counts.pages_fetched += 1;
                products.append(&mut page_products);
            }
            Err(err) => {
                tracing::warn!(
                    supplier = %profile.id,
                    url = %spec.url,
                    error = %err,
                    "supplier page failed"
                );
                counts.pages_failed += 1;
                failures.push(err);
            }
        }
    }

    counts.products = products.len();

    if failures.len() == requests.len() {
        let status = if failures.iter().all(ScraperError::is_timeout) {
            SupplierStatus::TimedOut
        } else {
            SupplierStatus::Error
        };
        return BranchOutcome {
            status,
            products: Vec::new(),
            counts,
            message: failures.first().map(ToString::to_string),
        };
    }

    BranchOutcome {
        status: SupplierStatus::Ok,
        products,
        counts,
        message: None,
    }
}

/// Locates, extracts, normalizes and scores one fetched page.
fn process_page(
    profile: &SupplierProfile,
    strategy: &Strategy,
    spec: &FetchSpec,
    response: &FetchResponse,
    ctx: &BranchContext<'_>,
    counts: &mut PipelineCounts,
) -> Result<Vec<Product>, ScraperError> {
    let document = strategy.layout().parse(&response.body)?;
    let nodes = strategy.locate_nodes(&document)?;
    counts.nodes_located += nodes.len();

    let page = PageContext {
        supplier_id: &profile.id,
        page_url: &response.url,
        category_hint: spec.category_hint,
        ceiling: ctx.config.max_nodes_per_page,
    };
    let extraction = extract_listings(strategy.layout(), &document, &nodes, &page)?;
    counts.nodes_over_ceiling += extraction.nodes_over_ceiling;
    counts.nodes_skipped += extraction.nodes_skipped;
    counts.listings_extracted += extraction.listings.len();

    let normalize_ctx = NormalizeContext {
        config: ctx.config,
        currency: profile.currency,
    };
    let hints = ctx.query.hints();
    let mut products = Vec::new();

    for raw in extraction.listings {
        let mut product = match normalize_listing(raw, &normalize_ctx) {
            Ok(product) => product,
            Err(rejection) => {
                rejection.record(counts);
                continue;
            }
        };

        let over_max = hints.max_price.is_some_and(|max| product.price.amount > max);
        let wrong_category = hints.category.is_some_and(|c| product.category != c);
        if over_max || wrong_category {
            counts.rejected_by_hint += 1;
            continue;
        }

        product.relevance = score(&product, ctx.terms);
        if !passes(product.relevance, ctx.config.min_relevance) {
            counts.rejected_relevance += 1;
            continue;
        }
        products.push(product);
    }

    tracing::debug!(
        supplier = %profile.id,
        url = %response.url,
        nodes = nodes.len(),
        products = products.len(),
        "processed page"
    );
    Ok(products)
}
