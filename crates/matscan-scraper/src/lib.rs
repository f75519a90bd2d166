pub mod client;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod layout;
pub mod normalize;
pub mod orchestrator;
pub mod parse;
pub mod price;
pub mod rank;
pub mod relevance;
pub mod retry;
pub mod strategy;
pub mod types;

pub use client::{fetch_checked, HttpFetcher, ReqwestFetcher, RetryPolicy};
pub use error::ScraperError;
pub use normalize::{normalize_listing, Rejection};
pub use orchestrator::{FetchSettings, QueryOrchestrator};
pub use price::{parse_price, ParsedPrice, PriceParseError};
pub use relevance::QueryTerms;
pub use strategy::{Coverage, Strategy};
pub use types::{FetchResponse, FetchSpec, NodeRef, RawListing};
