//! Extraction of [`RawListing`]s from a parsed page and its node refs.
//!
//! Every field is optional at this stage; deciding what is required belongs
//! to [`crate::normalize`]. A node is skipped only when it yields neither a
//! title nor a price, or no longer resolves against the body.

use std::collections::HashMap;

use matscan_core::Category;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::ScraperError;
use crate::layout::{format_mismatch, CompiledLayout, HtmlSelectors, JsonPaths, ParsedPage};
use crate::parse::collapse_whitespace;
use crate::types::{NodeRef, RawListing};

/// Attributes read when a price element has no text.
const PRICE_ATTRS: &[&str] = &["data-price", "content", "data-price-amount"];
/// Attributes read on the container itself for a SKU.
const SKU_ATTRS: &[&str] = &["data-sku", "data-product-sku", "data-product-id"];

/// Listings pulled from one page plus the nodes that did not produce one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub listings: Vec<RawListing>,
    /// Nodes past the per-page ceiling; never examined.
    pub nodes_over_ceiling: usize,
    pub nodes_skipped: usize,
}

/// Page-level inputs shared by every node on the page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub supplier_id: &'a str,
    /// Final page URL; relative links resolve against it.
    pub page_url: &'a str,
    pub category_hint: Option<Category>,
    /// Maximum nodes examined on this page.
    pub ceiling: usize,
}

/// Extracts listings for the first `page.ceiling` of `nodes` in `document`.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] when `document` was parsed for the
/// other layout format.
pub fn extract_listings(
    layout: &CompiledLayout,
    document: &ParsedPage,
    nodes: &[NodeRef],
    page: &PageContext<'_>,
) -> Result<Extraction, ScraperError> {
    let base = Url::parse(page.page_url).ok();
    let mut extraction = Extraction {
        nodes_over_ceiling: nodes.len().saturating_sub(page.ceiling),
        ..Extraction::default()
    };
    let nodes = &nodes[..nodes.len().min(page.ceiling)];

    match (layout, document) {
        (CompiledLayout::Html(selectors), ParsedPage::Html(html)) => {
            extract_html(selectors, html, nodes, page, base.as_ref(), &mut extraction);
        }
        (CompiledLayout::Json(paths), ParsedPage::Json(value)) => {
            extract_json(paths, value, nodes, page, base.as_ref(), &mut extraction);
        }
        _ => return Err(format_mismatch()),
    }

    tracing::debug!(
        supplier = page.supplier_id,
        listings = extraction.listings.len(),
        skipped = extraction.nodes_skipped,
        over_ceiling = extraction.nodes_over_ceiling,
        "extracted page"
    );
    Ok(extraction)
}

fn extract_html(
    selectors: &HtmlSelectors,
    document: &Html,
    nodes: &[NodeRef],
    page: &PageContext<'_>,
    base: Option<&Url>,
    out: &mut Extraction,
) {
    let mut matches: HashMap<usize, Vec<ElementRef<'_>>> = HashMap::new();

    for node in nodes {
        let NodeRef::Html {
            selector_index,
            ordinal,
        } = node
        else {
            out.nodes_skipped += 1;
            continue;
        };
        let Some(container) = selectors.containers.get(*selector_index) else {
            out.nodes_skipped += 1;
            continue;
        };
        let elements = matches
            .entry(*selector_index)
            .or_insert_with(|| document.select(container).collect());
        let Some(element) = elements.get(*ordinal).copied() else {
            out.nodes_skipped += 1;
            continue;
        };

        let title = first_text(element, &selectors.title).or_else(|| {
            first_attr(element, &selectors.title, &["title"])
        });
        let price_text = first_text(element, &selectors.price)
            .or_else(|| first_attr(element, &selectors.price, PRICE_ATTRS))
            .or_else(|| own_attr(element, PRICE_ATTRS));

        if title.is_none() && price_text.is_none() {
            out.nodes_skipped += 1;
            continue;
        }

        let url = first_attr(element, &selectors.link, &["href"])
            .or_else(|| own_attr(element, &["href"]))
            .and_then(|href| resolve_url(base, &href));
        let image_url = first_image(element, &selectors.image).and_then(|src| resolve_url(base, &src));
        let sku = first_text(element, &selectors.sku).or_else(|| own_attr(element, SKU_ATTRS));

        out.listings.push(RawListing {
            supplier_id: page.supplier_id.to_owned(),
            title,
            price_text,
            url,
            image_url,
            sku,
            category_hint: page.category_hint,
        });
    }
}

/// Collapsed text of the first match, trying selectors in order.
fn first_text(element: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element.select(selector).find_map(|m| {
            let text = collapse_whitespace(&m.text().collect::<String>());
            (!text.is_empty()).then_some(text)
        })
    })
}

/// First non-empty value of any of `attrs` on a match, trying selectors in order.
fn first_attr(element: ElementRef<'_>, selectors: &[Selector], attrs: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element
            .select(selector)
            .find_map(|m| own_attr(m, attrs))
    })
}

fn own_attr(element: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    })
}

/// Image source, preferring `data-src` when `src` is a lazy-load placeholder.
fn first_image(element: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element.select(selector).find_map(|img| {
            let src = own_attr(img, &["src"]).filter(|s| !s.starts_with("data:"));
            src.or_else(|| own_attr(img, &["data-src", "data-lazy-src"]))
        })
    })
}

fn extract_json(
    paths: &JsonPaths,
    value: &Value,
    nodes: &[NodeRef],
    page: &PageContext<'_>,
    base: Option<&Url>,
    out: &mut Extraction,
) {
    for node in nodes {
        let item = match node {
            NodeRef::Json { pointer } => value.pointer(pointer),
            NodeRef::Html { .. } => None,
        };
        let Some(item) = item.filter(|v| v.is_object()) else {
            out.nodes_skipped += 1;
            continue;
        };

        let title = json_text(item, &paths.title);
        let price_text = json_text(item, &paths.price);
        if title.is_none() && price_text.is_none() {
            out.nodes_skipped += 1;
            continue;
        }

        out.listings.push(RawListing {
            supplier_id: page.supplier_id.to_owned(),
            title,
            price_text,
            url: json_text(item, &paths.link).and_then(|href| resolve_url(base, &href)),
            image_url: paths
                .image
                .as_deref()
                .and_then(|p| json_text(item, p))
                .and_then(|src| resolve_url(base, &src)),
            sku: paths.sku.as_deref().and_then(|p| json_text(item, p)),
            category_hint: page.category_hint,
        });
    }
}

/// String or number at `pointer` within `item`, as trimmed text.
fn json_text(item: &Value, pointer: &str) -> Option<String> {
    match item.pointer(pointer)? {
        Value::String(s) => {
            let s = collapse_whitespace(s);
            (!s.is_empty()).then_some(s)
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves `href` against the page URL. Fragments and `javascript:` links
/// resolve to nothing.
#[must_use]
pub fn resolve_url(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
