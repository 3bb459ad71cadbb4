//! Web search service.
//!
//! `DuckDuckGoSearch` queries the DuckDuckGo HTML endpoint and scrapes the
//! ranked result links out of the returned page. The endpoint answers with
//! HTTP 202 and an empty result page when it wants clients to slow down;
//! that is surfaced as `SearchError::RateLimited`.

use crate::error::SearchError;
use crate::types::SearchResult;
use async_trait::async_trait;
use medassist_core::SearchSettings;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use url::Url;

/// A text search over the web.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Up to `max_results` results for `query`, in the service's ranking order.
    async fn text(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchResult>, SearchError>;
}

/// DuckDuckGo HTML search backend.
pub struct DuckDuckGoSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &SearchSettings) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            endpoint: settings.endpoint.clone(),
            client,
        })
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoSearch {
    async fn text(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!(query = %query, max_results, "Searching DuckDuckGo");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Err(SearchError::RateLimited {
                url: self.endpoint.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let results = parse_results(&body, max_results)?;

        tracing::debug!(count = results.len(), "Parsed search results");
        Ok(results)
    }
}

/// Extract ranked results from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);
    let container_sel =
        Selector::parse("div.result").map_err(|e| SearchError::Parse(e.to_string()))?;
    let link_sel =
        Selector::parse("a.result__a").map_err(|e| SearchError::Parse(e.to_string()))?;

    let mut results = Vec::new();
    for container in document.select(&container_sel) {
        if results.len() >= max_results {
            break;
        }

        // Sponsored entries share the container class
        if container.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let Some(anchor) = container.select(&link_sel).next() else {
            continue;
        };
        let href = anchor.value().attr("href").unwrap_or("").trim();
        let Some(url) = normalize_result_href(href) else {
            tracing::debug!(href = %href, "Dropping result without a usable link");
            continue;
        };
        let title = anchor
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        results.push(SearchResult { title, url });
    }

    Ok(results)
}

/// Resolve a result link to the destination URL.
///
/// DuckDuckGo wraps destinations in `/l/?uddg=<encoded>` redirects and often
/// emits protocol-relative links. Returns `None` when no http(s) URL can be
/// recovered.
pub fn normalize_result_href(href: &str) -> Option<String> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with("/l/") {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false)
        && parsed.path().starts_with("/l/");

    let destination = if is_redirect {
        let target = parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())?;
        Url::parse(target.trim()).ok()?
    } else {
        parsed
    };

    match destination.scheme() {
        "http" | "https" => Some(destination.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::stubs::{http_response, serve_once};

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result results_links result--ad">
            <a class="result__a" href="https://ads.example.com/buy">Sponsored pharmacy</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.mayoclinic.org%2Fdiseases%2Dconditions%2Fflu&amp;rut=abc">
              Influenza (flu) - Mayo   Clinic</a></h2>
            <a class="result__snippet">Flu is a viral infection...</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://medlineplus.gov/flu.html">Flu | MedlinePlus</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="javascript:void(0)">Broken</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://www.who.int/flu">WHO</a>
          </div>
        </body></html>"#;

    #[test]
    fn test_parse_results_in_rank_order() {
        let results = parse_results(RESULTS_PAGE, 10).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            SearchResult::new(
                "Influenza (flu) - Mayo Clinic",
                "https://www.mayoclinic.org/diseases-conditions/flu"
            )
        );
        assert_eq!(results[1].url, "https://medlineplus.gov/flu.html");
        assert_eq!(results[2].url, "https://www.who.int/flu");
    }

    #[test]
    fn test_parse_results_respects_cap() {
        let results = parse_results(RESULTS_PAGE, 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_unusable_link_does_not_use_up_cap() {
        let results = parse_results(RESULTS_PAGE, 3).unwrap();
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.mayoclinic.org/diseases-conditions/flu",
                "https://medlineplus.gov/flu.html",
                "https://www.who.int/flu",
            ]
        );
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_results("<html></html>", 5).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_plain_and_redirect_links() {
        assert_eq!(
            normalize_result_href("https://www.who.int/news").as_deref(),
            Some("https://www.who.int/news")
        );
        assert_eq!(
            normalize_result_href("/l/?uddg=https%3A%2F%2Fmedlineplus.gov%2Fflu.html").as_deref(),
            Some("https://medlineplus.gov/flu.html")
        );
        assert_eq!(normalize_result_href("mailto:help@example.com"), None);
        assert_eq!(normalize_result_href(""), None);
        assert_eq!(normalize_result_href("//duckduckgo.com/l/?kh=1"), None);
    }

    fn search_at(endpoint: String) -> DuckDuckGoSearch {
        DuckDuckGoSearch::new(&SearchSettings {
            endpoint,
            user_agent: "medassist-test".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_accepted_status_is_rate_limit() {
        let endpoint = serve_once(http_response("202 Accepted", "")).await;
        let err = search_at(endpoint).text("flu", 3).await.unwrap_err();

        assert!(matches!(err, SearchError::RateLimited { .. }), "{:?}", err);
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let endpoint = serve_once(http_response("500 Internal Server Error", "backend down")).await;
        let err = search_at(endpoint).text("flu", 3).await.unwrap_err();

        match &err {
            SearchError::Status { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body.as_str(), "backend down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_results_page_is_parsed() {
        let endpoint = serve_once(http_response("200 OK", RESULTS_PAGE)).await;
        let results = search_at(endpoint).text("flu", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].url, "https://medlineplus.gov/flu.html");
    }
}
