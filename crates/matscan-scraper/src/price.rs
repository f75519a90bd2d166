//! Price text parsing.
//!
//! Supplier price text arrives in many shapes: `"£21.80"`, `"£1,249.00"`,
//! `"£13.38 per m²"`, `"From £9.99 inc VAT"`, `"POA"`. A price must reduce to
//! exactly one amount; anything else is rejected rather than guessed.

use std::str::FromStr;
use std::sync::LazyLock;

use matscan_core::Currency;
use regex::Regex;
use rust_decimal::Decimal;

use crate::parse::collapse_whitespace;

/// Optional currency marker followed by a number with optional thousands
/// separators.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(£|€|\$|\bgbp\b|\beur\b|\busd\b)?\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)")
        .expect("valid regex")
});

/// A second figure joined to the first by a range marker: `"- £30"`, `"to 30"`.
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:-|–|to)\s*(?:£|€|\$)?\s*\d").expect("valid regex")
});

static TRAILING_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(gbp|eur|usd)\b").expect("valid regex"));

/// A successfully parsed price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrice {
    pub amount: Decimal,
    pub currency: Currency,
    /// Remaining text around the amount, e.g. `"per m²"`.
    pub annotation: Option<String>,
}

/// Why a price string could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceParseError {
    /// Nothing but whitespace.
    Empty,
    /// No amount, or more than one candidate amount.
    Unparseable,
}

/// One amount found in the text.
struct AmountMatch {
    start: usize,
    end: usize,
    currency: Option<Currency>,
    number: String,
}

/// Parses `text` into a single amount.
///
/// `default_currency` applies when the text carries no symbol or code.
/// A leading minus sign yields a negative amount; range checks are the
/// caller's job.
///
/// # Errors
///
/// [`PriceParseError::Empty`] for blank text, [`PriceParseError::Unparseable`]
/// when there is no amount (`"POA"`), a second currency amount
/// (`"£21.80 £18.17"`), or a range (`"£10 - £20"`).
pub fn parse_price(text: &str, default_currency: Currency) -> Result<ParsedPrice, PriceParseError> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return Err(PriceParseError::Empty);
    }

    let amounts = find_amounts(&text);
    let first = amounts.first().ok_or(PriceParseError::Unparseable)?;

    if amounts.iter().skip(1).any(|a| a.currency.is_some()) {
        return Err(PriceParseError::Unparseable);
    }

    let suffix = &text[first.end..];
    if RANGE_RE.is_match(suffix) {
        return Err(PriceParseError::Unparseable);
    }

    let mut prefix = &text[..first.start];
    let negative = prefix.trim_end().ends_with('-');
    if negative {
        prefix = prefix.trim_end().trim_end_matches('-');
    }

    let mut suffix = suffix;
    let mut currency = first.currency;
    if currency.is_none() {
        if let Some(caps) = TRAILING_CODE_RE.captures(suffix) {
            currency = currency_from_marker(&caps[1]);
            suffix = &suffix[caps[0].len()..];
        }
    }

    let mut amount =
        Decimal::from_str(&first.number.replace(',', "")).map_err(|_| PriceParseError::Unparseable)?;
    if negative {
        amount.set_sign_negative(true);
    }

    let annotation = collapse_whitespace(&format!("{} {}", prefix.trim(), suffix.trim()));
    Ok(ParsedPrice {
        amount,
        currency: currency.unwrap_or(default_currency),
        annotation: (!annotation.is_empty()).then_some(annotation),
    })
}

/// All amounts in `text`, skipping digits glued to a preceding letter such
/// as the `2` in `"m2"`.
fn find_amounts(text: &str) -> Vec<AmountMatch> {
    AMOUNT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(2)?;
            let marker = caps.get(1);
            if marker.is_none() {
                let glued = text[..number.start()]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphabetic);
                if glued {
                    return None;
                }
            }
            Some(AmountMatch {
                start: whole.start() + (whole.as_str().len() - whole.as_str().trim_start().len()),
                end: whole.end(),
                currency: marker.and_then(|m| currency_from_marker(m.as_str())),
                number: number.as_str().to_string(),
            })
        })
        .collect()
}

fn currency_from_marker(marker: &str) -> Option<Currency> {
    match marker.to_ascii_lowercase().as_str() {
        "£" | "gbp" => Some(Currency::Gbp),
        "€" | "eur" => Some(Currency::Eur),
        "$" | "usd" => Some(Currency::Usd),
        _ => None,
    }
}
