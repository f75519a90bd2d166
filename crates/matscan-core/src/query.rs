//! The immutable price-comparison query.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::Category;

/// Queries shorter than this (in characters, after trimming) are rejected.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query text is required")]
    Empty,

    #[error("query must be at least {min} characters long, got {len}")]
    TooShort { min: usize, len: usize },

    #[error("invalid query hint: {0}")]
    InvalidHint(String),
}

/// Optional structured hints that narrow a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHints {
    /// Products priced above this amount are dropped.
    pub max_price: Option<Decimal>,
    /// Restricts results (and category-navigation routes) to one category.
    pub category: Option<Category>,
    /// Requested result count; capped by the configured limit.
    pub max_results: Option<usize>,
    /// Country or region, matched against each supplier's `country`.
    pub location: Option<String>,
}

/// A free-text query plus hints. Fields are private so a query cannot be
/// altered once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    text: String,
    hints: QueryHints,
}

impl Query {
    /// Builds a query with no hints.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Empty`] or [`QueryError::TooShort`] when the
    /// trimmed text is unusable.
    pub fn new(text: impl Into<String>) -> Result<Self, QueryError> {
        Self::with_hints(text, QueryHints::default())
    }

    /// Builds a query with structured hints.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the text is empty or too short, when
    /// `max_price` is negative, or when `max_results` is zero.
    pub fn with_hints(text: impl Into<String>, hints: QueryHints) -> Result<Self, QueryError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QueryError::Empty);
        }
        let len = text.chars().count();
        if len < MIN_QUERY_CHARS {
            return Err(QueryError::TooShort {
                min: MIN_QUERY_CHARS,
                len,
            });
        }
        if hints.max_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(QueryError::InvalidHint(
                "max_price must not be negative".to_string(),
            ));
        }
        if hints.max_results == Some(0) {
            return Err(QueryError::InvalidHint(
                "max_results must be at least 1".to_string(),
            ));
        }
        let hints = QueryHints {
            location: hints
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            ..hints
        };
        Ok(Self { text, hints })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn hints(&self) -> &QueryHints {
        &self.hints
    }
}
