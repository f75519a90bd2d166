use matscan_core::{
    Category, FetchMethod, Query, SearchEndpointConfig, PAGE_PLACEHOLDER, QUERY_PLACEHOLDER,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::relevance::QueryTerms;
use crate::types::FetchSpec;

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Keyword search: the core query terms are substituted into a URL template
/// (GET) or form fields (POST), one request per results page.
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    search_url: String,
    method: FetchMethod,
    form: Vec<(String, String)>,
    pages: u32,
    page_param: Option<String>,
    categories: Vec<Category>,
}

impl SearchEndpoint {
    #[must_use]
    pub fn from_config(cfg: &SearchEndpointConfig) -> Self {
        Self {
            search_url: cfg.search_url.clone(),
            method: cfg.method,
            form: cfg.form.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            pages: cfg.pages.max(1),
            page_param: cfg.page_param.clone(),
            categories: cfg.categories.clone(),
        }
    }

    /// Whether the supplier stocks `category`. An empty list means it
    /// stocks everything.
    fn serves(&self, category: Option<Category>) -> bool {
        match category {
            Some(category) if !self.categories.is_empty() => self.categories.contains(&category),
            _ => true,
        }
    }

    pub(super) fn build_requests(&self, query: &Query, terms: &QueryTerms) -> Vec<FetchSpec> {
        let wanted = query.hints().category.or_else(|| terms.category());
        if !self.serves(wanted) {
            return Vec::new();
        }
        let text = terms.search_text();
        (1..=self.pages).map(|page| self.request_for(&text, page)).collect()
    }

    fn request_for(&self, text: &str, page: u32) -> FetchSpec {
        let encoded = utf8_percent_encode(text, QUERY_ENCODE_SET).to_string();
        let page_str = page.to_string();
        let mut url = self
            .search_url
            .replace(QUERY_PLACEHOLDER, &encoded)
            .replace(PAGE_PLACEHOLDER, &page_str);

        if page > 1 {
            if let Some(param) = &self.page_param {
                let sep = if url.contains('?') { '&' } else { '?' };
                url = format!("{url}{sep}{param}={page}");
            }
        }

        let form = match self.method {
            FetchMethod::Get => Vec::new(),
            FetchMethod::Post => self
                .form
                .iter()
                .map(|(k, v)| {
                    let value = v.replace(QUERY_PLACEHOLDER, text).replace(PAGE_PLACEHOLDER, &page_str);
                    (k.clone(), value)
                })
                .collect(),
        };

        FetchSpec {
            url,
            method: self.method,
            form,
            category_hint: None,
        }
    }
}
