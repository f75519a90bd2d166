//! Compiled node layouts: CSS selectors for HTML pages, JSON pointers for
//! API responses.
//!
//! Layouts are compiled once when the orchestrator is built, so a bad
//! selector in `suppliers.yaml` fails startup instead of every query.
//! A response body is parsed once into a [`ParsedPage`]; node location and
//! extraction both read that.

use matscan_core::NodeLayout;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::NodeRef;

#[derive(Debug)]
pub struct HtmlSelectors {
    pub containers: Vec<Selector>,
    pub title: Vec<Selector>,
    pub price: Vec<Selector>,
    pub link: Vec<Selector>,
    pub image: Vec<Selector>,
    pub sku: Vec<Selector>,
}

/// RFC 6901 pointers; `items` is absolute, the field pointers are relative
/// to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPaths {
    pub items: String,
    pub title: String,
    pub price: String,
    pub link: String,
    pub image: Option<String>,
    pub sku: Option<String>,
}

#[derive(Debug)]
pub enum CompiledLayout {
    Html(HtmlSelectors),
    Json(JsonPaths),
}

/// A response body parsed for one layout.
#[derive(Debug)]
pub enum ParsedPage {
    Html(Html),
    Json(Value),
}

impl CompiledLayout {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that
    /// does not parse.
    pub fn compile(layout: &NodeLayout, supplier_id: &str) -> Result<Self, ScraperError> {
        match layout {
            NodeLayout::Html(html) => Ok(CompiledLayout::Html(HtmlSelectors {
                containers: compile_all(&html.containers, supplier_id)?,
                title: compile_all(&html.title, supplier_id)?,
                price: compile_all(&html.price, supplier_id)?,
                link: compile_all(&html.link, supplier_id)?,
                image: compile_all(&html.image, supplier_id)?,
                sku: compile_all(&html.sku, supplier_id)?,
            })),
            NodeLayout::Json(json) => Ok(CompiledLayout::Json(JsonPaths {
                items: dotted_to_pointer(&json.items),
                title: dotted_to_pointer(&json.title),
                price: dotted_to_pointer(&json.price),
                link: dotted_to_pointer(&json.link),
                image: json.image.as_deref().map(dotted_to_pointer),
                sku: json.sku.as_deref().map(dotted_to_pointer),
            })),
        }
    }

    /// Parses `body` the way this layout reads it. HTML parsing never
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Parse`] when a JSON layout is given a body
    /// that is not valid JSON.
    pub fn parse(&self, body: &str) -> Result<ParsedPage, ScraperError> {
        match self {
            CompiledLayout::Html(_) => Ok(ParsedPage::Html(Html::parse_document(body))),
            CompiledLayout::Json(_) => serde_json::from_str(body)
                .map(ParsedPage::Json)
                .map_err(|e| ScraperError::parse("JSON response", e.to_string())),
        }
    }

    /// Finds product nodes in a parsed page.
    ///
    /// For HTML the container selectors are tried in priority order and the
    /// first one with any match is used for the whole page. An HTML page
    /// with no matches yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Parse`] when the items path of a JSON page
    /// does not lead to an array, or when `page` was parsed for the other
    /// layout format.
    pub fn locate(&self, page: &ParsedPage) -> Result<Vec<NodeRef>, ScraperError> {
        match (self, page) {
            (CompiledLayout::Html(selectors), ParsedPage::Html(document)) => {
                for (selector_index, selector) in selectors.containers.iter().enumerate() {
                    let count = document.select(selector).count();
                    if count > 0 {
                        return Ok((0..count)
                            .map(|ordinal| NodeRef::Html {
                                selector_index,
                                ordinal,
                            })
                            .collect());
                    }
                }
                Ok(Vec::new())
            }
            (CompiledLayout::Json(paths), ParsedPage::Json(value)) => {
                let items = value.pointer(&paths.items).ok_or_else(|| {
                    ScraperError::parse("JSON response", format!("no value at {}", paths.items))
                })?;
                let array = items.as_array().ok_or_else(|| {
                    ScraperError::parse("JSON response", format!("{} is not an array", paths.items))
                })?;
                Ok((0..array.len())
                    .map(|i| NodeRef::Json {
                        pointer: format!("{}/{i}", paths.items),
                    })
                    .collect())
            }
            _ => Err(format_mismatch()),
        }
    }
}

pub(crate) fn format_mismatch() -> ScraperError {
    ScraperError::parse("response", "page parsed for a different layout format")
}

fn compile_all(selectors: &[String], supplier_id: &str) -> Result<Vec<Selector>, ScraperError> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| ScraperError::InvalidSelector {
                supplier_id: supplier_id.to_owned(),
                selector: raw.clone(),
                reason: format!("{e:?}"),
            })
        })
        .collect()
}

/// Converts `"data.products"` to `"/data/products"`. The empty path is the
/// document root.
#[must_use]
pub fn dotted_to_pointer(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}
