//! Query relevance scoring.
//!
//! A query is reduced to its core terms (stopwords such as "cheapest" or
//! "uk" removed), each weighted by kind: size tokens 3.0, plain words 2.0,
//! brand words 1.5. A product's score is the matched weight over the total
//! weight, compared against the tokens of its name, brand and category
//! label. Scoring never fails; a query with no core terms scores zero
//! against everything.

use std::collections::HashSet;

use matscan_core::{Category, Product};
use rust_decimal::Decimal;

use crate::parse::{category_tokens, infer_category, is_size_token, thickness_mm, tokenize};

const SIZE_WEIGHT: f64 = 3.0;
const WORD_WEIGHT: f64 = 2.0;
const BRAND_WEIGHT: f64 = 1.5;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "best", "buy", "cheap", "cheapest", "deal", "deals", "for", "in", "me",
    "near", "of", "price", "prices", "the", "uk", "with",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Size,
    Brand,
    Word,
}

impl TermKind {
    fn weight(self) -> f64 {
        match self {
            TermKind::Size => SIZE_WEIGHT,
            TermKind::Brand => BRAND_WEIGHT,
            TermKind::Word => WORD_WEIGHT,
        }
    }
}

/// The weighted core terms of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerms {
    terms: Vec<(String, TermKind)>,
}

impl QueryTerms {
    /// Tokenizes `query_text`, drops stopwords and duplicate tokens, and
    /// classifies each remaining token against the known `brands`.
    #[must_use]
    pub fn new(query_text: &str, brands: &[String]) -> Self {
        let brand_tokens: HashSet<String> = brands.iter().flat_map(|b| tokenize(b)).collect();
        let mut seen = HashSet::new();
        let terms = tokenize(query_text)
            .into_iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .filter(|t| seen.insert(t.clone()))
            .map(|t| {
                let kind = if is_size_token(&t) {
                    TermKind::Size
                } else if brand_tokens.contains(&t) {
                    TermKind::Brand
                } else {
                    TermKind::Word
                };
                (t, kind)
            })
            .collect();
        Self { terms }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermKind)> {
        self.terms.iter().map(|(t, k)| (t.as_str(), *k))
    }

    /// Core terms joined by spaces; what search endpoints are sent.
    #[must_use]
    pub fn search_text(&self) -> String {
        self.terms
            .iter()
            .map(|(t, _)| t.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Smallest millimetre size in the query, e.g. `50` for "50mm PIR".
    #[must_use]
    pub fn thickness_mm(&self) -> Option<Decimal> {
        let tokens: Vec<String> = self.terms.iter().map(|(t, _)| t.clone()).collect();
        thickness_mm(&tokens)
    }

    /// Category implied by the query words, if any.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        let tokens: Vec<String> = self.terms.iter().map(|(t, _)| t.clone()).collect();
        match infer_category(&tokens) {
            Category::Other => None,
            category => Some(category),
        }
    }

    fn total_weight(&self) -> f64 {
        self.terms.iter().map(|(_, k)| k.weight()).sum()
    }
}

/// Tokens a product can be matched on: name, brand and category label.
#[must_use]
pub fn product_tokens(product: &Product) -> HashSet<String> {
    let mut tokens: HashSet<String> = tokenize(&product.name).into_iter().collect();
    if let Some(brand) = &product.brand {
        tokens.extend(tokenize(brand));
    }
    tokens.extend(category_tokens(product.category));
    tokens.extend(product.size_tokens.iter().cloned());
    tokens
}

/// Scores `product` against `terms`, in `[0, 1]`.
#[must_use]
pub fn score(product: &Product, terms: &QueryTerms) -> f64 {
    let total = terms.total_weight();
    if total <= 0.0 {
        return 0.0;
    }
    let tokens = product_tokens(product);
    let matched: f64 = terms
        .terms
        .iter()
        .filter(|(t, _)| tokens.contains(t))
        .map(|(_, k)| k.weight())
        .sum();
    (matched / total).clamp(0.0, 1.0)
}

/// A product is kept when at least one core term matched and the score
/// reaches `min_relevance`.
#[must_use]
pub fn passes(score: f64, min_relevance: f64) -> bool {
    score > 0.0 && score >= min_relevance
}
