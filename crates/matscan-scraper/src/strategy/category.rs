use matscan_core::{Category, CategoryNavigationConfig, Query, RouteConfig};
use rust_decimal::Decimal;

use crate::parse::tokenize;
use crate::relevance::QueryTerms;
use crate::types::FetchSpec;

#[derive(Debug, Clone)]
struct Route {
    url: String,
    category: Category,
    thickness_mm: Option<Decimal>,
    /// Each keyword pre-tokenized; a keyword matches when all its tokens are
    /// query terms.
    keywords: Vec<Vec<String>>,
}

impl Route {
    fn from_config(cfg: &RouteConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            category: cfg.category,
            thickness_mm: cfg.thickness_mm.map(|t| t.normalize()),
            keywords: cfg
                .keywords
                .iter()
                .map(|k| tokenize(k))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches_keyword(&self, query_tokens: &[&str]) -> bool {
        self.keywords
            .iter()
            .any(|kw| kw.iter().all(|t| query_tokens.contains(&t.as_str())))
    }
}

/// Navigation through fixed category pages for suppliers without usable
/// search. Query hints (category, thickness, keywords) pick the routes.
#[derive(Debug, Clone)]
pub struct CategoryNavigation {
    routes: Vec<Route>,
    max_requests: usize,
}

impl CategoryNavigation {
    #[must_use]
    pub fn from_config(cfg: &CategoryNavigationConfig) -> Self {
        Self {
            routes: cfg.routes.iter().map(Route::from_config).collect(),
            max_requests: cfg.max_requests.max(1),
        }
    }

    pub(super) fn build_requests(&self, query: &Query, terms: &QueryTerms) -> Vec<FetchSpec> {
        let wanted = query.hints().category.or_else(|| terms.category());
        let thickness = terms.thickness_mm().map(|t| t.normalize());
        let query_tokens: Vec<&str> = terms.iter().map(|(t, _)| t).collect();
        let keyword_hit = self.routes.iter().any(|r| r.matches_keyword(&query_tokens));

        if wanted.is_none() && thickness.is_none() && !keyword_hit {
            return Vec::new();
        }

        let mut selected: Vec<&Route> = self
            .routes
            .iter()
            .filter(|r| wanted.is_none_or(|c| r.category == c))
            .collect();

        if let Some(thickness) = thickness {
            let exact: Vec<&Route> = selected
                .iter()
                .copied()
                .filter(|r| r.thickness_mm == Some(thickness))
                .collect();
            selected = if exact.is_empty() {
                selected.into_iter().filter(|r| r.thickness_mm.is_none()).collect()
            } else {
                exact
            };
        }

        if selected.iter().any(|r| r.matches_keyword(&query_tokens)) {
            selected.retain(|r| r.matches_keyword(&query_tokens));
        }

        selected
            .into_iter()
            .take(self.max_requests)
            .map(|r| FetchSpec {
                category_hint: Some(r.category),
                ..FetchSpec::get(r.url.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use matscan_core::{JsonLayout, NodeLayout, QueryHints};

    use super::*;

    fn route(url: &str, category: Category, thickness: Option<i64>, keywords: &[&str]) -> RouteConfig {
        RouteConfig {
            url: format!("https://nav.example{url}"),
            category,
            thickness_mm: thickness.map(|t| Decimal::new(t, 0)),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn config(max_requests: usize) -> CategoryNavigationConfig {
        CategoryNavigationConfig {
            routes: vec![
                route("/pir/25mm", Category::PirInsulation, Some(25), &[]),
                route("/pir/50mm", Category::PirInsulation, Some(50), &[]),
                route("/pir/50mm-foil", Category::PirInsulation, Some(50), &["foil backed"]),
                route("/pir/all", Category::PirInsulation, None, &[]),
                route("/wool/slabs", Category::MineralWool, None, &["slab", "acoustic"]),
                route("/plasterboard", Category::Plasterboard, None, &["gyproc"]),
            ],
            max_requests,
            layout: NodeLayout::Json(JsonLayout {
                items: "products".to_string(),
                title: "name".to_string(),
                price: "price".to_string(),
                link: "url".to_string(),
                image: None,
                sku: None,
            }),
        }
    }

    fn urls(max_requests: usize, query: &Query) -> Vec<String> {
        let terms = QueryTerms::new(query.text(), &[]);
        CategoryNavigation::from_config(&config(max_requests))
            .build_requests(query, &terms)
            .into_iter()
            .map(|r| r.url)
            .collect()
    }

    #[test]
    fn category_and_thickness_pick_exact_routes() {
        let got = urls(4, &Query::new("50mm PIR insulation").unwrap());
        assert_eq!(
            got,
            vec!["https://nav.example/pir/50mm", "https://nav.example/pir/50mm-foil"]
        );
    }

    #[test]
    fn keyword_narrows_routes() {
        let got = urls(4, &Query::new("50mm foil backed PIR").unwrap());
        assert_eq!(got, vec!["https://nav.example/pir/50mm-foil"]);
    }

    #[test]
    fn unknown_thickness_falls_back_to_general_routes() {
        let got = urls(4, &Query::new("120mm PIR board").unwrap());
        assert_eq!(got, vec!["https://nav.example/pir/all"]);
    }

    #[test]
    fn category_hint_overrides_query_words() {
        let query = Query::with_hints(
            "acoustic slab",
            QueryHints {
                category: Some(Category::MineralWool),
                ..QueryHints::default()
            },
        )
        .unwrap();
        assert_eq!(urls(4, &query), vec!["https://nav.example/wool/slabs"]);
    }

    #[test]
    fn keyword_alone_selects_route() {
        assert_eq!(
            urls(4, &Query::new("gyproc wallboard").unwrap()),
            vec!["https://nav.example/plasterboard"]
        );
    }

    #[test]
    fn unmappable_query_has_no_routes() {
        assert!(urls(4, &Query::new("timber decking").unwrap()).is_empty());
    }

    #[test]
    fn requests_capped_and_carry_route_category() {
        let query = Query::new("PIR insulation").unwrap();
        let terms = QueryTerms::new(query.text(), &[]);
        let requests = CategoryNavigation::from_config(&config(2)).build_requests(&query, &terms);
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|r| r.category_hint == Some(Category::PirInsulation)));
    }
}
