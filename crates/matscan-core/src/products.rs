use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product category used for price sanity bounds and relevance matching.
///
/// `Other` is the catch-all for listings that match none of the known
/// building-material families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PirInsulation,
    MineralWool,
    Plasterboard,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PirInsulation,
        Category::MineralWool,
        Category::Plasterboard,
        Category::Other,
    ];

    /// Human-readable label, e.g. `"PIR Insulation"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::PirInsulation => "PIR Insulation",
            Category::MineralWool => "Mineral Wool",
            Category::Plasterboard => "Plasterboard",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        match key.as_str() {
            "pir" | "pirinsulation" => Ok(Category::PirInsulation),
            "mineralwool" | "wool" => Ok(Category::MineralWool),
            "plasterboard" => Ok(Category::Plasterboard),
            "other" => Ok(Category::Other),
            _ => Err(format!(
                "unknown category '{s}'; expected one of pir_insulation, mineral_wool, plasterboard, other"
            )),
        }
    }
}

/// ISO 4217 currencies recognised in supplier price text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Currency {
    #[default]
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A comparable price: decimal amount plus currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

/// A validated, normalized and scored listing ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub supplier_id: String,
    /// Whitespace-collapsed listing title. Never empty.
    pub name: String,
    pub brand: Option<String>,
    pub category: Category,
    pub price: Money,
    /// Text that accompanied the price but is not part of the amount,
    /// e.g. `"per m²"` or `"inc VAT"`.
    pub price_annotation: Option<String>,
    /// Absolute product page URL.
    pub url: String,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    /// Smallest millimetre dimension found in the name (board thickness).
    pub thickness_mm: Option<Decimal>,
    /// Normalized size tokens from the name, e.g. `["1200mm", "2400mm", "50mm"]`.
    pub size_tokens: Vec<String>,
    /// Query relevance in `[0, 1]`; zero until scored.
    pub relevance: f64,
    /// Identity used to collapse equivalent listings.
    pub dedup_key: String,
}

/// Terminal state of one supplier branch of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupplierStatus {
    Ok,
    TimedOut,
    Error,
    Disabled,
    /// The supplier's strategy had no coverage for the query.
    Skipped,
}

impl SupplierStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SupplierStatus::Ok => "ok",
            SupplierStatus::TimedOut => "timed-out",
            SupplierStatus::Error => "error",
            SupplierStatus::Disabled => "disabled",
            SupplierStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for SupplierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counters for one supplier branch. Individual node and listing
/// failures are only ever reported through these totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounts {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub nodes_located: usize,
    /// Nodes beyond the per-page ceiling that were never processed.
    pub nodes_over_ceiling: usize,
    pub nodes_skipped: usize,
    pub listings_extracted: usize,
    pub rejected_missing_name: usize,
    pub rejected_missing_price: usize,
    pub rejected_price_unparseable: usize,
    pub rejected_price_out_of_range: usize,
    pub rejected_missing_url: usize,
    /// Priced in a currency other than the comparison currency.
    pub rejected_foreign_currency: usize,
    pub rejected_relevance: usize,
    /// Dropped by a query hint (max price or category).
    pub rejected_by_hint: usize,
    pub products: usize,
}

impl PipelineCounts {
    /// Adds every counter in `other` onto `self`.
    pub fn merge(&mut self, other: &PipelineCounts) {
        self.pages_fetched += other.pages_fetched;
        self.pages_failed += other.pages_failed;
        self.nodes_located += other.nodes_located;
        self.nodes_over_ceiling += other.nodes_over_ceiling;
        self.nodes_skipped += other.nodes_skipped;
        self.listings_extracted += other.listings_extracted;
        self.rejected_missing_name += other.rejected_missing_name;
        self.rejected_missing_price += other.rejected_missing_price;
        self.rejected_price_unparseable += other.rejected_price_unparseable;
        self.rejected_price_out_of_range += other.rejected_price_out_of_range;
        self.rejected_missing_url += other.rejected_missing_url;
        self.rejected_foreign_currency += other.rejected_foreign_currency;
        self.rejected_relevance += other.rejected_relevance;
        self.rejected_by_hint += other.rejected_by_hint;
        self.products += other.products;
    }

    /// Listings rejected by validation (excludes relevance and hint drops).
    #[must_use]
    pub fn validation_rejections(&self) -> usize {
        self.rejected_missing_name
            + self.rejected_missing_price
            + self.rejected_price_unparseable
            + self.rejected_price_out_of_range
            + self.rejected_missing_url
            + self.rejected_foreign_currency
    }
}

/// Per-supplier outcome attached to a [`SearchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierReport {
    pub supplier_id: String,
    pub supplier_name: String,
    pub status: SupplierStatus,
    /// Products this supplier contributed before deduplication and truncation.
    pub product_count: usize,
    pub elapsed_ms: u64,
    /// Short failure description for `error` and `timed-out` branches.
    pub message: Option<String>,
    pub counts: PipelineCounts,
}

/// The ranked answer to one query. Built once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query_id: Uuid,
    pub query: String,
    pub searched_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Products that survived deduplication, before truncation.
    pub total_candidates: usize,
    /// Price ascending, then relevance descending, then supplier id.
    pub products: Vec<Product>,
    /// One report per configured supplier, ordered by supplier id.
    pub suppliers: Vec<SupplierReport>,
}

impl SearchResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Status recorded for `supplier_id`, if the supplier is configured.
    #[must_use]
    pub fn status_of(&self, supplier_id: &str) -> Option<SupplierStatus> {
        self.suppliers
            .iter()
            .find(|r| r.supplier_id == supplier_id)
            .map(|r| r.status)
    }

    /// Ids of suppliers that were actually queried (not disabled or skipped).
    #[must_use]
    pub fn searched_suppliers(&self) -> Vec<&str> {
        self.suppliers
            .iter()
            .filter(|r| !matches!(r.status, SupplierStatus::Disabled | SupplierStatus::Skipped))
            .map(|r| r.supplier_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_report(id: &str, status: SupplierStatus) -> SupplierReport {
        SupplierReport {
            supplier_id: id.to_string(),
            supplier_name: id.to_uppercase(),
            status,
            product_count: 0,
            elapsed_ms: 0,
            message: None,
            counts: PipelineCounts::default(),
        }
    }

    fn make_result(reports: Vec<SupplierReport>) -> SearchResult {
        SearchResult {
            query_id: Uuid::new_v4(),
            query: "50mm pir".to_string(),
            searched_at: Utc::now(),
            elapsed_ms: 12,
            total_candidates: 0,
            products: vec![],
            suppliers: reports,
        }
    }

    #[test]
    fn category_parses_common_spellings() {
        assert_eq!("pir".parse::<Category>().unwrap(), Category::PirInsulation);
        assert_eq!(
            "PIR Insulation".parse::<Category>().unwrap(),
            Category::PirInsulation
        );
        assert_eq!(
            "mineral_wool".parse::<Category>().unwrap(),
            Category::MineralWool
        );
        assert_eq!(
            "Plasterboard".parse::<Category>().unwrap(),
            Category::Plasterboard
        );
        assert!("timber".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::MineralWool).unwrap();
        assert_eq!(json, "\"mineral_wool\"");
    }

    #[test]
    fn money_displays_symbol_and_two_decimals() {
        let money = Money {
            amount: Decimal::new(1338, 2),
            currency: Currency::Gbp,
        };
        assert_eq!(money.to_string(), "£13.38");

        let whole = Money {
            amount: Decimal::new(21, 0),
            currency: Currency::Eur,
        };
        assert_eq!(whole.to_string(), "€21.00");
    }

    #[test]
    fn supplier_status_serializes_kebab_case() {
        let json = serde_json::to_string(&SupplierStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed-out\"");
        assert_eq!(SupplierStatus::TimedOut.to_string(), "timed-out");
    }

    #[test]
    fn pipeline_counts_merge_adds_fields() {
        let mut a = PipelineCounts {
            pages_fetched: 1,
            nodes_skipped: 2,
            rejected_missing_url: 1,
            ..PipelineCounts::default()
        };
        let b = PipelineCounts {
            pages_fetched: 2,
            nodes_skipped: 1,
            rejected_price_unparseable: 3,
            ..PipelineCounts::default()
        };
        a.merge(&b);
        assert_eq!(a.pages_fetched, 3);
        assert_eq!(a.nodes_skipped, 3);
        assert_eq!(a.validation_rejections(), 4);
    }

    #[test]
    fn search_result_status_lookup() {
        let result = make_result(vec![
            make_report("a", SupplierStatus::Ok),
            make_report("b", SupplierStatus::TimedOut),
        ]);
        assert_eq!(result.status_of("b"), Some(SupplierStatus::TimedOut));
        assert_eq!(result.status_of("zzz"), None);
        assert!(result.is_empty());
    }

    #[test]
    fn searched_suppliers_excludes_disabled_and_skipped() {
        let result = make_result(vec![
            make_report("a", SupplierStatus::Ok),
            make_report("b", SupplierStatus::Disabled),
            make_report("c", SupplierStatus::Skipped),
            make_report("d", SupplierStatus::Error),
        ]);
        assert_eq!(result.searched_suppliers(), vec!["a", "d"]);
    }
}
