//! Query orchestration: concurrent fan-out to suppliers, fan-in to ranking.
//!
//! # Lifecycle of one query
//!
//! 1. Every configured supplier gets a report slot. Disabled suppliers,
//!    suppliers in a different country from a recognised location hint and
//!    strategies with no coverage are settled up front.
//! 2. The rest are spawned onto a [`JoinSet`], one task each, every task
//!    bounded by its supplier timeout.
//! 3. Results are joined until the set drains or the overall deadline
//!    passes; on the deadline the outstanding tasks are aborted and
//!    reported `timed-out`.
//! 4. Surviving products are deduplicated, then ranked and truncated.
//!
//! Nothing is shared mutably between tasks: each task owns its listings and
//! hands its products back by value.

mod supplier;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use matscan_core::{
    AppConfig, PipelineCounts, Product, Query, SearchConfig, SearchResult, SupplierProfile,
    SupplierReport, SupplierStatus,
};
use tokio::task::JoinSet;
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::{duration_ms, HttpFetcher, RetryPolicy};
use crate::dedup::deduplicate;
use crate::error::ScraperError;
use crate::rank::rank;
use crate::relevance::QueryTerms;
use crate::strategy::{Coverage, Strategy};
use crate::types::FetchSpec;

use supplier::{run_branch, BranchContext, BranchOutcome};

/// Per-request limits applied to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Process-wide ceiling on a single request, on top of the supplier and
    /// overall deadlines.
    pub request_ceiling: Duration,
    pub retry: RetryPolicy,
}

impl FetchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_ceiling: Duration::from_secs(config.request_timeout_secs),
            retry: RetryPolicy::from_app_config(config),
        }
    }
}

#[derive(Debug)]
struct SupplierUnit {
    profile: SupplierProfile,
    /// `None` for disabled suppliers; their selectors are never compiled.
    strategy: Option<Strategy>,
}

#[derive(Debug)]
struct Shared<F> {
    config: SearchConfig,
    units: Vec<SupplierUnit>,
    settings: FetchSettings,
    fetcher: Arc<F>,
}

/// Drives one query across every configured supplier.
///
/// Built once at startup and reused for every query; holds no per-query
/// state.
#[derive(Debug)]
pub struct QueryOrchestrator<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for QueryOrchestrator<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: HttpFetcher + 'static> QueryOrchestrator<F> {
    /// Compiles every enabled supplier's strategy.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Config`] if the config is invalid or no supplier is
    ///   enabled.
    /// - [`ScraperError::InvalidSelector`] for a selector that does not parse.
    pub fn new(
        config: SearchConfig,
        settings: FetchSettings,
        fetcher: Arc<F>,
    ) -> Result<Self, ScraperError> {
        config
            .validate()
            .map_err(|e| ScraperError::Config(e.to_string()))?;
        if config.enabled_suppliers().next().is_none() {
            return Err(ScraperError::Config(
                "no enabled suppliers configured".to_string(),
            ));
        }

        let units = config
            .suppliers
            .iter()
            .map(|profile| {
                let strategy = if profile.enabled {
                    Some(Strategy::from_profile(profile)?)
                } else {
                    None
                };
                Ok::<_, ScraperError>(SupplierUnit {
                    profile: profile.clone(),
                    strategy,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                units,
                settings,
                fetcher,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.shared.config
    }

    /// Runs `query` against every supplier and returns the ranked result.
    ///
    /// Never fails: supplier failures surface as report statuses and an
    /// empty product list is a valid answer. Returns within the overall
    /// timeout.
    pub async fn run_query(&self, query: Query) -> SearchResult {
        let started = Instant::now();
        let overall_deadline = started + self.shared.config.overall_timeout();
        let query_id = Uuid::new_v4();
        let searched_at = Utc::now();
        let query = Arc::new(query);
        let terms = Arc::new(QueryTerms::new(query.text(), &self.shared.config.brands));

        tracing::debug!(%query_id, query = %query.text(), "query received");

        let mut reports: Vec<Option<SupplierReport>> = vec![None; self.shared.units.len()];
        let mut products: Vec<Product> = Vec::new();
        let mut tasks = JoinSet::new();

        for (index, unit) in self.shared.units.iter().enumerate() {
            let Some(strategy) = &unit.strategy else {
                reports[index] = Some(settled_report(
                    &unit.profile,
                    SupplierStatus::Disabled,
                    "supplier disabled",
                ));
                continue;
            };
            if let Some(location) = &query.hints().location {
                if !serves_location(&unit.profile, location) {
                    reports[index] = Some(settled_report(
                        &unit.profile,
                        SupplierStatus::Skipped,
                        "supplier does not serve the requested location",
                    ));
                    continue;
                }
            }
            let requests = match strategy.build_requests(&query) {
                Coverage::Requests(requests) => requests,
                Coverage::NoCoverage => {
                    reports[index] = Some(settled_report(
                        &unit.profile,
                        SupplierStatus::Skipped,
                        "no coverage for query",
                    ));
                    continue;
                }
            };

            tasks.spawn(branch_task(
                Arc::clone(&self.shared),
                index,
                requests,
                Arc::clone(&query),
                Arc::clone(&terms),
                overall_deadline,
            ));
        }

        tracing::info!(%query_id, dispatched = tasks.len(), "query dispatched");

        let mut overall_expired = false;
        loop {
            match tokio::time::timeout_at(overall_deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome, elapsed)))) => {
                    let profile = &self.shared.units[index].profile;
                    let BranchOutcome {
                        status,
                        products: branch_products,
                        counts,
                        message,
                    } = outcome;
                    if status != SupplierStatus::Ok {
                        tracing::warn!(
                            %query_id,
                            supplier = %profile.id,
                            %status,
                            message = message.as_deref().unwrap_or(""),
                            "supplier branch failed"
                        );
                    }
                    reports[index] = Some(SupplierReport {
                        supplier_id: profile.id.clone(),
                        supplier_name: profile.name.clone(),
                        status,
                        product_count: branch_products.len(),
                        elapsed_ms: duration_ms(elapsed),
                        message,
                        counts,
                    });
                    products.extend(branch_products);
                }
                Ok(Some(Err(join_err))) => {
                    tracing::warn!(%query_id, error = %join_err, "supplier task aborted");
                }
                Ok(None) => break,
                Err(_) => {
                    overall_expired = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        let elapsed = started.elapsed();
        let mut suppliers: Vec<SupplierReport> = reports
            .into_iter()
            .zip(&self.shared.units)
            .map(|(report, unit)| {
                report.unwrap_or_else(|| {
                    let (status, message) = if overall_expired {
                        (SupplierStatus::TimedOut, "overall query timeout reached")
                    } else {
                        (SupplierStatus::Error, "supplier task failed")
                    };
                    SupplierReport {
                        elapsed_ms: duration_ms(elapsed),
                        ..settled_report(&unit.profile, status, message)
                    }
                })
            })
            .collect();
        suppliers.sort_by(|a, b| a.supplier_id.cmp(&b.supplier_id));

        tracing::info!(
            %query_id,
            joined = products.len(),
            overall_expired,
            "query joined"
        );

        let deduped = deduplicate(products);
        let total_candidates = deduped.len();
        let limit = self
            .shared
            .config
            .effective_max_results(query.hints().max_results);
        let products = rank(deduped, limit);

        tracing::info!(
            %query_id,
            total_candidates,
            returned = products.len(),
            elapsed_ms = duration_ms(elapsed),
            "query ranked"
        );

        SearchResult {
            query_id,
            query: query.text().to_string(),
            searched_at,
            elapsed_ms: duration_ms(elapsed),
            total_candidates,
            products,
            suppliers,
        }
    }
}

/// One spawned supplier branch, bounded by its supplier timeout.
async fn branch_task<F: HttpFetcher + 'static>(
    shared: Arc<Shared<F>>,
    index: usize,
    requests: Vec<FetchSpec>,
    query: Arc<Query>,
    terms: Arc<QueryTerms>,
    overall_deadline: Instant,
) -> (usize, BranchOutcome, Duration) {
    let started = Instant::now();
    let unit = &shared.units[index];
    let timeout = shared.config.supplier_timeout(&unit.profile);
    let deadline = (started + timeout).min(overall_deadline);

    let outcome = match &unit.strategy {
        Some(strategy) => {
            let ctx = BranchContext {
                config: &shared.config,
                query: &query,
                terms: &terms,
                settings: shared.settings,
                deadline,
            };
            let branch = run_branch(
                shared.fetcher.as_ref(),
                &unit.profile,
                strategy,
                &requests,
                &ctx,
            );
            match tokio::time::timeout_at(deadline, branch).await {
                Ok(outcome) => outcome,
                Err(_) => BranchOutcome {
                    status: SupplierStatus::TimedOut,
                    products: Vec::new(),
                    counts: PipelineCounts::default(),
                    message: Some(format!(
                        "supplier timed out after {}ms",
                        duration_ms(timeout)
                    )),
                },
            }
        }
        None => BranchOutcome {
            status: SupplierStatus::Disabled,
            products: Vec::new(),
            counts: PipelineCounts::default(),
            message: None,
        },
    };
    (index, outcome, started.elapsed())
}

fn settled_report(profile: &SupplierProfile, status: SupplierStatus, message: &str) -> SupplierReport {
    SupplierReport {
        supplier_id: profile.id.clone(),
        supplier_name: profile.name.clone(),
        status,
        product_count: 0,
        elapsed_ms: 0,
        message: Some(message.to_string()),
        counts: PipelineCounts::default(),
    }
}

/// Whether a supplier may be queried for `location`.
///
/// A supplier is only excluded when both the hint and its `country` name a
/// known region and the two differ. Towns, counties and postcodes are not
/// resolved, so they never exclude anyone.
fn serves_location(profile: &SupplierProfile, location: &str) -> bool {
    let wanted = region_key(location);
    let served = profile.country.as_deref().and_then(region_key);
    match (wanted, served) {
        (Some(wanted), Some(served)) => wanted == served,
        _ => true,
    }
}

/// Folds common spellings of a country onto one key; `None` for anything
/// not recognised as a country.
fn region_key(value: &str) -> Option<&'static str> {
    let key: String = value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "uk" | "gb" | "gbr" | "unitedkingdom" | "greatbritain" | "britain" | "england"
        | "scotland" | "wales" | "northernireland" => Some("uk"),
        "ie" | "irl" | "ireland" | "eire" | "republicofireland" => Some("ie"),
        "fr" | "fra" | "france" => Some("fr"),
        "de" | "deu" | "germany" => Some("de"),
        "nl" | "nld" | "netherlands" => Some("nl"),
        "es" | "esp" | "spain" => Some("es"),
        "us" | "usa" | "unitedstates" => Some("us"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../orchestrator_test.rs"]
mod tests;
