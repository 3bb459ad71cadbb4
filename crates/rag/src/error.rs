//! Errors raised at the search and fetch seams.
//!
//! These never escape the retrieval routines as failures; the routines fold
//! them into empty results. They are typed so the pharmacy lookup can tell a
//! rate limit apart from everything else.

use medassist_core::AppError;
use thiserror::Error;

/// Marker the search service puts in the description of a rate-limit error.
pub const RATE_LIMIT_MARKER: &str = "202 Ratelimit";

/// Errors from the web search service.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The service asked the caller to back off
    #[error("{url} {marker}", marker = RATE_LIMIT_MARKER)]
    RateLimited { url: String },

    /// Transport-level failure
    #[error("search request failed: {0}")]
    Http(String),

    /// Non-success HTTP status other than the rate-limit one
    #[error("search returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The results page could not be understood
    #[error("failed to parse search results: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Whether this error is the service's rate-limit signal.
    ///
    /// Decided on the rendered description, so errors from any backend that
    /// carry the marker text are treated alike.
    pub fn is_rate_limited(&self) -> bool {
        self.to_string().contains(RATE_LIMIT_MARKER)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Http(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        AppError::Search(err.to_string())
    }
}

/// Errors from fetching a single result page.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("failed to fetch {url}: {reason}")]
    Http { url: String, reason: String },
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Search(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_carries_marker() {
        let err = SearchError::RateLimited {
            url: "https://html.duckduckgo.com/html/".to_string(),
        };
        assert_eq!(err.to_string(), "https://html.duckduckgo.com/html/ 202 Ratelimit");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_marker_detected_in_other_variants() {
        let err = SearchError::Other("upstream said: 202 Ratelimit".to_string());
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_plain_errors_are_not_rate_limits() {
        assert!(!SearchError::Http("connection reset".to_string()).is_rate_limited());
        assert!(!SearchError::Status {
            status: 500,
            body: "oops".to_string()
        }
        .is_rate_limited());
    }

    #[test]
    fn test_converts_into_app_error() {
        let app: AppError = FetchError::Timeout("https://who.int".to_string()).into();
        assert!(matches!(app, AppError::Search(ref m) if m.contains("who.int")));
    }
}
