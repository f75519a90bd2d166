//! Request, response and listing shapes passed between pipeline stages.
//!
//! ### Node references
//! A [`NodeRef`] points into a response body without borrowing it.
//! `scraper::Html` is not `Send`, so parsed documents never cross an
//! `.await`; the strategy records which container selector matched and the
//! ordinal of each node, and the extractor re-selects from its own parse.
//!
//! ### JSON pointers
//! JSON nodes are addressed with RFC 6901 pointers (`/data/products/3`) so
//! the extractor can use `serde_json::Value::pointer` directly.

use matscan_core::{Category, FetchMethod};

/// One HTTP request a strategy wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    pub url: String,
    pub method: FetchMethod,
    /// Form fields for `POST` requests, in declaration order.
    pub form: Vec<(String, String)>,
    /// Category of a navigation route; used when a listing's own title does
    /// not identify one.
    pub category_hint: Option<Category>,
}

impl FetchSpec {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Get,
            form: Vec::new(),
            category_hint: None,
        }
    }
}

/// Body and status of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// Final URL after redirects; relative product links resolve against it.
    pub url: String,
    /// Parsed `Retry-After` header, when the server sent one.
    pub retry_after_secs: Option<u64>,
}

/// Location of one product node inside a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Html {
        /// Index of the container selector that matched.
        selector_index: usize,
        /// Position among that selector's matches, in document order.
        ordinal: usize,
    },
    Json { pointer: String },
}

/// Unvalidated text pulled from one product node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub supplier_id: String,
    pub title: Option<String>,
    pub price_text: Option<String>,
    /// Absolute URL, already resolved against the page URL.
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub category_hint: Option<Category>,
}
