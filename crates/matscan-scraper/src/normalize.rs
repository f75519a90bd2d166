//! Validation and normalization from [`RawListing`] to [`Product`].
//!
//! Text parsing is delegated to [`crate::parse`] and [`crate::price`]; this
//! module decides what is required and what is out of bounds. A listing that
//! fails is never an error value: it maps to a [`Rejection`] that the caller
//! counts.

use matscan_core::{Category, Currency, Money, PipelineCounts, Product, SearchConfig};

use crate::dedup::dedup_key;
use crate::parse::{collapse_whitespace, detect_brand, infer_category, size_tokens, thickness_mm, tokenize};
use crate::price::{parse_price, PriceParseError};
use crate::types::RawListing;

/// Why a raw listing did not become a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    MissingName,
    MissingPrice,
    PriceUnparseable,
    PriceOutOfRange,
    MissingUrl,
    ForeignCurrency,
}

impl Rejection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::MissingName => "missing-name",
            Rejection::MissingPrice => "missing-price",
            Rejection::PriceUnparseable => "price-unparseable",
            Rejection::PriceOutOfRange => "price-out-of-range",
            Rejection::MissingUrl => "missing-url",
            Rejection::ForeignCurrency => "foreign-currency",
        }
    }

    /// Increments the matching counter in `counts`.
    pub fn record(self, counts: &mut PipelineCounts) {
        match self {
            Rejection::MissingName => counts.rejected_missing_name += 1,
            Rejection::MissingPrice => counts.rejected_missing_price += 1,
            Rejection::PriceUnparseable => counts.rejected_price_unparseable += 1,
            Rejection::PriceOutOfRange => counts.rejected_price_out_of_range += 1,
            Rejection::MissingUrl => counts.rejected_missing_url += 1,
            Rejection::ForeignCurrency => counts.rejected_foreign_currency += 1,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-supplier inputs to normalization.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub config: &'a SearchConfig,
    /// Currency assumed for price text without a symbol.
    pub currency: Currency,
}

/// Normalizes a [`RawListing`] into a [`Product`] with relevance zero.
///
/// The category comes from the title; when the title names no known family
/// the listing's route category is used instead.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies, checked in the order name,
/// price, URL, currency, price bounds.
pub fn normalize_listing(raw: RawListing, ctx: &NormalizeContext<'_>) -> Result<Product, Rejection> {
    let name = raw
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|n| !n.is_empty())
        .ok_or(Rejection::MissingName)?;

    let price_text = raw.price_text.as_deref().ok_or(Rejection::MissingPrice)?;
    let parsed = parse_price(price_text, ctx.currency).map_err(|e| match e {
        PriceParseError::Empty => Rejection::MissingPrice,
        PriceParseError::Unparseable => Rejection::PriceUnparseable,
    })?;

    let url = raw
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(Rejection::MissingUrl)?;

    if parsed.currency != ctx.config.currency {
        return Err(Rejection::ForeignCurrency);
    }

    let tokens = tokenize(&name);
    let category = match infer_category(&tokens) {
        Category::Other => raw.category_hint.unwrap_or(Category::Other),
        inferred => inferred,
    };

    if parsed.amount.is_sign_negative() || !ctx.config.bounds_for(category).contains(parsed.amount) {
        return Err(Rejection::PriceOutOfRange);
    }

    let brand = detect_brand(&tokens, &ctx.config.brands);
    let sizes = size_tokens(&tokens);
    let key = dedup_key(brand.as_deref(), &tokens, &sizes);

    Ok(Product {
        supplier_id: raw.supplier_id,
        name,
        brand,
        category,
        price: Money {
            amount: parsed.amount,
            currency: parsed.currency,
        },
        price_annotation: parsed.annotation,
        url,
        image_url: raw.image_url,
        sku: raw.sku.filter(|s| !s.trim().is_empty()),
        thickness_mm: thickness_mm(&tokens),
        size_tokens: sizes,
        relevance: 0.0,
        dedup_key: key,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
