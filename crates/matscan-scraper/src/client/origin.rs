//! URL origin and domain helpers for request headers and error messages.

/// Extracts the scheme+host origin from a page URL.
///
/// Given `"https://www.wickes.co.uk/search?text=pir"`, returns
/// `"https://www.wickes.co.uk"`. Used as the `Referer` so a request looks like
/// it came from the supplier's own site.
#[must_use]
pub fn extract_origin(url: &str) -> String {
    reqwest::Url::parse(url).map_or_else(
        |_| {
            url.trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
