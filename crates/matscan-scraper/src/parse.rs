//! Text normalization shared by the validator, relevance filter and
//! deduplicator: tokenizing titles, extracting size tokens, and inferring
//! category and brand.
//!
//! Size tokens are canonical: lengths are expressed in millimetres
//! (`"5cm"` → `"50mm"`, `"2.4m"` → `"2400mm"`), areas as `m2`, and trailing
//! zeros are dropped (`"50.0mm"` → `"50mm"`). Two listings that describe the
//! same board the same way therefore produce identical size tokens.

use std::str::FromStr;
use std::sync::LazyLock;

use matscan_core::Category;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

/// Number followed by a space and a unit: `"50 mm"`, `"2.4 m"`.
static SPACED_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d(?:\.\d+)?)\s+(mm|cm|sqm|m2|m3|kg|m)\b").expect("valid regex")
});

/// Dimension groups such as `"2400 x 1200 x 50mm"` or `"1.2mx2.4m"`.
static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d+(?:\.\d+)?(?:mm|cm|m)?\s*[x×*]\s*)+\d+(?:\.\d+)?(?:mm|cm|m)?\b")
        .expect("valid regex")
});

static DIMENSION_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(mm|cm|m)?$").expect("valid regex"));

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?[a-z0-9]*|[a-z][a-z0-9]*").expect("valid regex")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(mm|cm|m|m2|m3|sqm|kg)$").expect("valid regex")
});

const PIR_WORDS: &[&str] = &[
    "pir",
    "celotex",
    "kingspan",
    "ecotherm",
    "recticel",
    "xtratherm",
    "eurothane",
    "polyisocyanurate",
    "thermaroof",
    "thermawall",
];

const MINERAL_WOOL_WORDS: &[&str] = &[
    "wool",
    "rockwool",
    "earthwool",
    "glasswool",
    "isover",
    "superglass",
    "rwa45",
    "flexi",
];

const PLASTERBOARD_WORDS: &[&str] = &["plasterboard", "gyproc", "drywall", "siniat", "wallboard"];

/// Collapses runs of whitespace to single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercases `text` and splits it into normalized tokens.
///
/// Units separated from their number are joined (`"50 mm"` → `"50mm"`),
/// dimension groups are split into one size token per dimension with the
/// group's unit carried to unit-less parts, and every size token is put in
/// canonical form.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase().replace('²', "2").replace('³', "3");
    let joined = SPACED_UNIT_RE.replace_all(&lower, "${1}${2}");
    let split = DIMENSION_RE.replace_all(&joined, |caps: &Captures<'_>| split_dimensions(&caps[0]));

    TOKEN_RE
        .find_iter(&split)
        .map(|m| canonical_size(m.as_str()).unwrap_or_else(|| m.as_str().to_string()))
        .collect()
}

/// Rewrites `"2400 x 1200 x 50mm"` as `"2400mm 1200mm 50mm"`.
fn split_dimensions(group: &str) -> String {
    let parts: Vec<(String, Option<String>)> = group
        .split(['x', '×', '*'])
        .filter_map(|part| {
            let caps = DIMENSION_PART_RE.captures(part.trim())?;
            Some((caps[1].to_string(), caps.get(2).map(|u| u.as_str().to_string())))
        })
        .collect();

    let fallback_unit = parts.iter().rev().find_map(|(_, unit)| unit.clone());
    parts
        .into_iter()
        .map(|(number, unit)| match unit.or_else(|| fallback_unit.clone()) {
            Some(unit) => format!("{number}{unit}"),
            None => number,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the canonical form of a size token, or `None` if `token` is not
/// a number with a recognised unit or the converted value does not fit a
/// `Decimal`. Such tokens are kept verbatim by the caller.
fn canonical_size(token: &str) -> Option<String> {
    let caps = SIZE_RE.captures(token)?;
    let value = Decimal::from_str(&caps[1]).ok()?;
    let (value, unit) = match &caps[2] {
        "cm" => (value.checked_mul(Decimal::TEN)?, "mm"),
        "m" => (value.checked_mul(Decimal::ONE_THOUSAND)?, "mm"),
        "sqm" => (value, "m2"),
        other => (value, other),
    };
    Some(format!("{}{unit}", value.normalize()))
}

#[must_use]
pub fn is_size_token(token: &str) -> bool {
    SIZE_RE.is_match(token)
}

/// Size tokens among `tokens`, sorted and de-duplicated.
#[must_use]
pub fn size_tokens(tokens: &[String]) -> Vec<String> {
    let mut sizes: Vec<String> = tokens.iter().filter(|t| is_size_token(t)).cloned().collect();
    sizes.sort();
    sizes.dedup();
    sizes
}

/// Smallest millimetre dimension among `tokens`, taken as board thickness.
#[must_use]
pub fn thickness_mm(tokens: &[String]) -> Option<Decimal> {
    tokens
        .iter()
        .filter_map(|t| t.strip_suffix("mm"))
        .filter_map(|n| Decimal::from_str(n).ok())
        .min()
}

/// Infers the product family from title tokens. PIR keywords take
/// precedence over mineral wool, which takes precedence over plasterboard.
#[must_use]
pub fn infer_category(tokens: &[String]) -> Category {
    let has_any = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));
    let has_pair = |a: &str, b: &str| tokens.windows(2).any(|w| w[0] == a && w[1] == b);

    if has_any(PIR_WORDS) {
        Category::PirInsulation
    } else if has_any(MINERAL_WOOL_WORDS) {
        Category::MineralWool
    } else if has_any(PLASTERBOARD_WORDS) || has_pair("plaster", "board") {
        Category::Plasterboard
    } else {
        Category::Other
    }
}

/// Finds the first known brand whose tokens appear contiguously in `title`.
///
/// Multi-word brands are tried before shorter ones, so `"Knauf Insulation"`
/// wins over `"Knauf"`. Returns the brand as spelled in `brands`.
#[must_use]
pub fn detect_brand(title_tokens: &[String], brands: &[String]) -> Option<String> {
    let mut candidates: Vec<(&String, Vec<String>)> = brands
        .iter()
        .map(|b| (b, tokenize(b)))
        .filter(|(_, toks)| !toks.is_empty())
        .collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    candidates
        .into_iter()
        .find(|(_, toks)| title_tokens.windows(toks.len()).any(|w| w == toks.as_slice()))
        .map(|(brand, _)| brand.clone())
}

/// Tokens that describe the category itself, e.g. `["pir", "insulation"]`.
/// `Other` contributes none.
#[must_use]
pub fn category_tokens(category: Category) -> Vec<String> {
    match category {
        Category::Other => Vec::new(),
        other => tokenize(other.label()),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
