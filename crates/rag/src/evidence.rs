//! Evidence retrieval from trusted medical sites.
//!
//! One search restricted to an allow-list of domains, then each hit is
//! fetched and reduced to its paragraph text. Pages that fail in any way are
//! skipped; the batch always completes.

use crate::extract::{extract_paragraph_text, truncate_chars};
use crate::fetch::PageFetcher;
use crate::search::SearchEngine;
use crate::types::{EvidenceBundle, PageOutcome, SearchResult};
use medassist_core::RetrievalSettings;
use std::sync::Arc;
use std::time::Duration;

/// Fetches and condenses trusted-source text for a medical condition.
pub struct EvidenceRetriever {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn PageFetcher>,
    settings: RetrievalSettings,
}

impl EvidenceRetriever {
    pub fn new(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            search,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Search query for `condition` limited to the trusted domains.
    pub fn build_query(&self, condition: &str) -> String {
        let sites = self
            .settings
            .trusted_domains
            .iter()
            .map(|domain| format!("site:{}", domain))
            .collect::<Vec<_>>()
            .join(" OR ");

        if sites.is_empty() {
            condition.to_string()
        } else {
            format!("{} {}", condition, sites)
        }
    }

    /// Retrieve evidence for `condition`.
    ///
    /// Never fails: a search error or a batch where every page was skipped
    /// both produce an empty bundle, which callers must treat as "no data".
    pub async fn retrieve(&self, condition: &str) -> EvidenceBundle {
        let query = self.build_query(condition);
        tracing::info!(condition = %condition, "Retrieving medical evidence");

        // Single attempt: a rate-limited search is not retried here
        let results = match self.search.text(&query, self.settings.max_results).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "Evidence search failed");
                return EvidenceBundle::default();
            }
        };

        let mut outcomes = Vec::with_capacity(results.len());
        for result in &results {
            outcomes.push(self.process_result(result).await);
        }

        for outcome in &outcomes {
            if let PageOutcome::Skipped { url, reason } = outcome {
                tracing::debug!(url = %url, reason = %reason, "Skipped search result");
            }
        }

        let bundle = EvidenceBundle::from_outcomes(outcomes);
        tracing::info!(
            results = results.len(),
            excerpts = bundle.len(),
            "Evidence retrieval finished"
        );
        bundle
    }

    /// Fetch one result page and turn it into an outcome.
    async fn process_result(&self, result: &SearchResult) -> PageOutcome {
        let url = result.url.clone();
        if url.is_empty() {
            return PageOutcome::Skipped {
                url,
                reason: "result has no link".to_string(),
            };
        }

        let timeout = Duration::from_secs(self.settings.page_timeout_secs);
        let html = match self.fetcher.fetch(&url, timeout).await {
            Ok(html) => html,
            Err(e) => {
                return PageOutcome::Skipped {
                    url,
                    reason: e.to_string(),
                }
            }
        };

        let text = extract_paragraph_text(&html);
        if text.is_empty() {
            return PageOutcome::Skipped {
                url,
                reason: "no paragraph text".to_string(),
            };
        }

        PageOutcome::Extracted {
            excerpt: truncate_chars(&text, self.settings.max_excerpt_chars).to_string(),
            url,
        }
    }
}
