//! Per-supplier access patterns.
//!
//! A supplier is bound to exactly one variant of a closed set, chosen by
//! `strategy.kind` in `suppliers.yaml`:
//!
//! - [`SearchEndpoint`]: the query goes into a URL template or form.
//! - [`CategoryNavigation`]: query hints select fixed category pages.
//!
//! Both share one capability set: build the requests for a query, and
//! locate product nodes in a response. A strategy that cannot serve a query
//! says so with [`Coverage::NoCoverage`]; that is not an error.

mod category;
mod search;

use matscan_core::{Query, StrategyConfig, SupplierProfile};

use crate::error::ScraperError;
use crate::layout::{CompiledLayout, ParsedPage};
use crate::relevance::QueryTerms;
use crate::types::{FetchSpec, NodeRef};

pub use category::CategoryNavigation;
pub use search::SearchEndpoint;

/// Outcome of mapping a query onto a supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// Requests to issue, in order. Never empty.
    Requests(Vec<FetchSpec>),
    NoCoverage,
}

impl Coverage {
    fn from_requests(requests: Vec<FetchSpec>) -> Self {
        if requests.is_empty() {
            Coverage::NoCoverage
        } else {
            Coverage::Requests(requests)
        }
    }
}

#[derive(Debug)]
pub enum StrategyKind {
    SearchEndpoint(SearchEndpoint),
    CategoryNavigation(CategoryNavigation),
}

/// A supplier's request builder plus its compiled node layout.
#[derive(Debug)]
pub struct Strategy {
    kind: StrategyKind,
    layout: CompiledLayout,
}

impl Strategy {
    /// Builds the strategy bound to `profile`, compiling its selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if a CSS selector does not
    /// parse.
    pub fn from_profile(profile: &SupplierProfile) -> Result<Self, ScraperError> {
        let layout = CompiledLayout::compile(profile.strategy.layout(), &profile.id)?;
        let kind = match &profile.strategy {
            StrategyConfig::SearchEndpoint(cfg) => {
                StrategyKind::SearchEndpoint(SearchEndpoint::from_config(cfg))
            }
            StrategyConfig::CategoryNavigation(cfg) => {
                StrategyKind::CategoryNavigation(CategoryNavigation::from_config(cfg))
            }
        };
        Ok(Self { kind, layout })
    }

    /// Maps `query` onto this supplier's requests.
    #[must_use]
    pub fn build_requests(&self, query: &Query) -> Coverage {
        let terms = QueryTerms::new(query.text(), &[]);
        if terms.is_empty() {
            return Coverage::NoCoverage;
        }
        let requests = match &self.kind {
            StrategyKind::SearchEndpoint(search) => search.build_requests(query, &terms),
            StrategyKind::CategoryNavigation(nav) => nav.build_requests(query, &terms),
        };
        Coverage::from_requests(requests)
    }

    /// Finds product nodes in a page parsed with [`Strategy::layout`].
    ///
    /// # Errors
    ///
    /// See [`CompiledLayout::locate`].
    pub fn locate_nodes(&self, page: &ParsedPage) -> Result<Vec<NodeRef>, ScraperError> {
        self.layout.locate(page)
    }

    #[must_use]
    pub fn layout(&self) -> &CompiledLayout {
        &self.layout
    }

    #[must_use]
    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }
}
