//! Final ordering and truncation of the merged product list.

use std::cmp::Ordering;

use matscan_core::Product;

/// Total order over products: currency, price ascending, relevance
/// descending, supplier id ascending, then URL and name so that no two
/// distinct products compare equal.
///
/// Amounts are only compared within one currency; normalization already
/// drops listings outside the comparison currency.
#[must_use]
pub fn compare_products(a: &Product, b: &Product) -> Ordering {
    a.price
        .currency
        .cmp(&b.price.currency)
        .then_with(|| a.price.amount.cmp(&b.price.amount))
        .then_with(|| b.relevance.total_cmp(&a.relevance))
        .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        .then_with(|| a.url.cmp(&b.url))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorts `products` and keeps the first `limit`. Truncation always happens
/// after sorting.
#[must_use]
pub fn rank(mut products: Vec<Product>, limit: usize) -> Vec<Product> {
    products.sort_by(compare_products);
    products.truncate(limit);
    products
}

#[cfg(test)]
mod tests {
    use matscan_core::{Category, Currency, Money};
    use rust_decimal::Decimal;

    use super::*;

    fn product(supplier: &str, cents: i64, relevance: f64, url: &str) -> Product {
        priced(supplier, cents, Currency::Gbp, relevance, url)
    }

    fn priced(supplier: &str, cents: i64, currency: Currency, relevance: f64, url: &str) -> Product {
        Product {
            supplier_id: supplier.to_string(),
            name: format!("Board from {supplier}"),
            brand: None,
            category: Category::PirInsulation,
            price: Money {
                amount: Decimal::new(cents, 2),
                currency,
            },
            price_annotation: None,
            url: url.to_string(),
            image_url: None,
            sku: None,
            thickness_mm: None,
            size_tokens: vec![],
            relevance,
            dedup_key: url.to_string(),
        }
    }

    fn prices(products: &[Product]) -> Vec<Decimal> {
        products.iter().map(|p| p.price.amount).collect()
    }

    #[test]
    fn sorts_by_price_ascending() {
        let ranked = rank(
            vec![
                product("a", 3096, 1.0, "https://a/2"),
                product("c", 1338, 1.0, "https://c/1"),
                product("a", 2180, 1.0, "https://a/1"),
            ],
            10,
        );
        assert_eq!(
            prices(&ranked),
            vec![
                Decimal::new(1338, 2),
                Decimal::new(2180, 2),
                Decimal::new(3096, 2)
            ]
        );
    }

    #[test]
    fn ties_broken_by_relevance_then_supplier() {
        let ranked = rank(
            vec![
                product("b", 1000, 0.5, "https://b/1"),
                product("c", 1000, 0.9, "https://c/1"),
                product("a", 1000, 0.5, "https://a/1"),
            ],
            10,
        );
        let order: Vec<&str> = ranked.iter().map(|p| p.supplier_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let items = vec![
            product("b", 1000, 0.5, "https://b/1"),
            product("a", 900, 0.7, "https://a/1"),
            product("a", 1000, 0.5, "https://a/2"),
            product("c", 1000, 0.5, "https://c/1"),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(rank(items, 10), rank(reversed, 10));
    }

    #[test]
    fn amounts_in_different_currencies_do_not_interleave() {
        let ranked = rank(
            vec![
                priced("x", 1200, Currency::Eur, 1.0, "https://x/1"),
                priced("y", 1100, Currency::Gbp, 1.0, "https://y/1"),
                priced("y", 1300, Currency::Gbp, 1.0, "https://y/2"),
            ],
            10,
        );
        let order: Vec<String> = ranked.iter().map(|p| p.price.to_string()).collect();
        assert_eq!(order, vec!["£11.00", "£13.00", "€12.00"]);
    }

    #[test]
    fn truncates_after_sorting() {
        let ranked = rank(
            vec![
                product("a", 5000, 1.0, "https://a/1"),
                product("b", 100, 1.0, "https://b/1"),
                product("c", 200, 1.0, "https://c/1"),
            ],
            2,
        );
        assert_eq!(prices(&ranked), vec![Decimal::new(100, 2), Decimal::new(200, 2)]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(rank(vec![], 5).is_empty());
    }
}
