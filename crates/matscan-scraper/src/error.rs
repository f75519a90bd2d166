use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("request to {url} timed out after {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("invalid selector \"{selector}\" for supplier {supplier_id}: {reason}")]
    InvalidSelector {
        supplier_id: String,
        selector: String,
        reason: String,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    /// Builds a [`ScraperError::Parse`] for a response body.
    pub(crate) fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a fetch deadline rather than a hard failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            ScraperError::Timeout { .. } => true,
            ScraperError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timeout() {
        let err = ScraperError::Timeout {
            url: "https://example.com/search?q=pir".to_string(),
            after_ms: 1500,
        };
        assert_eq!(
            err.to_string(),
            "request to https://example.com/search?q=pir timed out after 1500ms"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn display_invalid_selector() {
        let err = ScraperError::InvalidSelector {
            supplier_id: "wickes".to_string(),
            selector: "div[".to_string(),
            reason: "unexpected end of input".to_string(),
        };
        assert!(err.to_string().contains("wickes"));
        assert!(err.to_string().contains("div["));
        assert!(!err.is_timeout());
    }

    #[test]
    fn parse_helper_builds_parse_variant() {
        let err = ScraperError::parse("json body", "expected value at line 1");
        assert!(matches!(err, ScraperError::Parse { .. }));
        assert_eq!(
            err.to_string(),
            "failed to parse json body: expected value at line 1"
        );
    }
}
