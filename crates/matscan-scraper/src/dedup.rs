//! Collapsing listings that describe the same physical product.
//!
//! The dedup key is `brand|name words|sizes`, all lowercased and sorted, so
//! word order and spacing in a title do not matter. Category words such as
//! `pir` or `wool` are left out of the key: one supplier often names the
//! same board with and without them. Within one supplier the
//! cheapest listing per key survives; the same key from different suppliers
//! is kept once per supplier.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::parse::{category_tokens, is_size_token, tokenize};
use crate::rank::compare_products;
use matscan_core::{Category, Product};

/// Words that vary between listings of the same board.
const FILLER_WORDS: &[&str] = &[
    "and", "board", "boards", "for", "insulation", "pack", "sheet", "sheets", "the", "with", "x",
];

/// Tokens of every category label.
static CATEGORY_WORDS: LazyLock<Vec<String>> = LazyLock::new(|| {
    Category::ALL
        .into_iter()
        .flat_map(category_tokens)
        .collect()
});

/// Builds the dedup key from a brand and already-tokenized title.
#[must_use]
pub fn dedup_key(brand: Option<&str>, title_tokens: &[String], sizes: &[String]) -> String {
    let brand_tokens = brand.map(tokenize).unwrap_or_default();
    let mut words: Vec<&str> = title_tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !is_size_token(t))
        .filter(|t| !FILLER_WORDS.contains(t))
        .filter(|t| !CATEGORY_WORDS.iter().any(|c| c == t))
        .filter(|t| !brand_tokens.iter().any(|b| b == t))
        .collect();
    words.sort_unstable();
    words.dedup();

    let mut sizes: Vec<&str> = sizes.iter().map(String::as_str).collect();
    sizes.sort_unstable();
    sizes.dedup();

    format!(
        "{}|{}|{}",
        brand_tokens.join(" "),
        words.join(" "),
        sizes.join(",")
    )
}

/// Keeps the best listing per `(dedup_key, supplier_id)`.
///
/// "Best" is the first under [`compare_products`]: cheapest, then most
/// relevant. Output is ordered by key then supplier id, so the result does
/// not depend on input order and applying it twice changes nothing.
#[must_use]
pub fn deduplicate(products: Vec<Product>) -> Vec<Product> {
    let mut best: BTreeMap<(String, String), Product> = BTreeMap::new();
    for product in products {
        let key = (product.dedup_key.clone(), product.supplier_id.clone());
        match best.get(&key) {
            Some(current) if compare_products(current, &product).is_le() => {}
            _ => {
                best.insert(key, product);
            }
        }
    }
    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use matscan_core::{Category, Currency, Money};
    use rust_decimal::Decimal;

    use super::*;

    fn product(supplier: &str, name: &str, cents: i64, url: &str) -> Product {
        let tokens = tokenize(name);
        let sizes = crate::parse::size_tokens(&tokens);
        Product {
            supplier_id: supplier.to_string(),
            name: name.to_string(),
            brand: Some("Celotex".to_string()),
            category: Category::PirInsulation,
            price: Money {
                amount: Decimal::new(cents, 2),
                currency: Currency::Gbp,
            },
            price_annotation: None,
            url: url.to_string(),
            image_url: None,
            sku: None,
            thickness_mm: None,
            dedup_key: dedup_key(Some("Celotex"), &tokens, &sizes),
            size_tokens: sizes,
            relevance: 1.0,
        }
    }

    #[test]
    fn key_ignores_word_order_spacing_and_filler() {
        let a = tokenize("Celotex GA4000 50mm PIR Insulation Board");
        let b = tokenize("celotex  PIR  ga4000 50 mm");
        assert_eq!(
            dedup_key(Some("Celotex"), &a, &crate::parse::size_tokens(&a)),
            dedup_key(Some("Celotex"), &b, &crate::parse::size_tokens(&b))
        );
    }

    #[test]
    fn key_distinguishes_thickness() {
        let a = tokenize("Celotex GA4000 50mm");
        let b = tokenize("Celotex GA4000 100mm");
        assert_ne!(
            dedup_key(Some("Celotex"), &a, &crate::parse::size_tokens(&a)),
            dedup_key(Some("Celotex"), &b, &crate::parse::size_tokens(&b))
        );
    }

    #[test]
    fn key_shape() {
        let t = tokenize("Celotex GA4000 2400 x 1200 x 50mm");
        assert_eq!(
            dedup_key(Some("Celotex"), &t, &crate::parse::size_tokens(&t)),
            "celotex|ga4000|1200mm,2400mm,50mm"
        );
        assert_eq!(dedup_key(None, &tokenize("PIR board"), &[]), "||");
        assert_eq!(
            dedup_key(None, &tokenize("Knauf Mineral Wool Loft Roll"), &[]),
            "|knauf loft roll|"
        );
    }

    #[test]
    fn same_supplier_duplicates_collapse_to_cheapest() {
        let out = deduplicate(vec![
            product("a", "Celotex GA4000 50mm", 3096, "https://a/1"),
            product("a", "Celotex GA4000 50 mm PIR Board", 2180, "https://a/2"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].price.amount, Decimal::new(2180, 2));
    }

    #[test]
    fn cross_supplier_duplicates_coexist() {
        let out = deduplicate(vec![
            product("a", "Celotex GA4000 50mm", 2180, "https://a/1"),
            product("c", "Celotex GA4000 50mm", 1338, "https://c/1"),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let items = vec![
            product("a", "Celotex GA4000 50mm", 3096, "https://a/1"),
            product("a", "Celotex GA4000 50mm", 2180, "https://a/2"),
            product("b", "Celotex GA4000 50mm", 2500, "https://b/1"),
            product("a", "Celotex GA4000 100mm", 4000, "https://a/3"),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(deduplicate(items), deduplicate(reversed));
    }

    #[test]
    fn deduplication_is_idempotent() {
        let once = deduplicate(vec![
            product("a", "Celotex GA4000 50mm", 3096, "https://a/1"),
            product("a", "Celotex GA4000 50mm", 2180, "https://a/2"),
            product("b", "Celotex GA4000 50mm", 2500, "https://b/1"),
        ]);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }
}
