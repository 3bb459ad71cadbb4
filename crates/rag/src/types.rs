//! Retrieval data types.

use serde::{Deserialize, Serialize};

/// One ranked hit from the web search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// What happened to a single search result during evidence retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Paragraph text was extracted (already truncated)
    Extracted { url: String, excerpt: String },

    /// The result contributed nothing; `reason` is for logging only
    Skipped { url: String, reason: String },
}

/// Evidence gathered for one condition: excerpts plus the pages they came from.
///
/// `sources[i]` is the page `excerpts[i]` was taken from, in retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    excerpts: Vec<String>,
    pub sources: Vec<String>,
}

/// Separator between excerpts in the assembled evidence text.
pub const EXCERPT_SEPARATOR: &str = "\n\n";

impl EvidenceBundle {
    /// Fold per-result outcomes into a bundle, keeping only extracted pages.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = PageOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut bundle, outcome| {
                if let PageOutcome::Extracted { url, excerpt } = outcome {
                    bundle.excerpts.push(excerpt);
                    bundle.sources.push(url);
                }
                bundle
            })
    }

    /// All excerpts joined by a blank line. Empty when nothing was retrieved.
    pub fn text(&self) -> String {
        self.excerpts.join(EXCERPT_SEPARATOR)
    }

    pub fn excerpts(&self) -> &[String] {
        &self.excerpts
    }

    pub fn is_empty(&self) -> bool {
        self.excerpts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.excerpts.len()
    }

    /// Sources as a markdown bullet list of links.
    pub fn source_list_markdown(&self) -> String {
        source_list_markdown(&self.sources)
    }

    /// The `(text, sources)` pair handed to prompt assembly.
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.text(), self.sources)
    }
}

/// Markdown bullet list linking each url to itself.
pub fn source_list_markdown(sources: &[String]) -> String {
    sources
        .iter()
        .map(|url| format!("- [{url}]({url})"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A pharmacy listing returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyEntry {
    pub name: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(url: &str, excerpt: &str) -> PageOutcome {
        PageOutcome::Extracted {
            url: url.to_string(),
            excerpt: excerpt.to_string(),
        }
    }

    #[test]
    fn test_skipped_outcomes_contribute_nothing() {
        let bundle = EvidenceBundle::from_outcomes(vec![
            extracted("https://a", "first"),
            PageOutcome::Skipped {
                url: "https://b".to_string(),
                reason: "timeout".to_string(),
            },
            extracted("https://c", "third"),
        ]);

        assert_eq!(bundle.text(), "first\n\nthird");
        assert_eq!(bundle.sources, vec!["https://a", "https://c"]);
        assert_eq!(bundle.len(), bundle.sources.len());
    }

    #[test]
    fn test_empty_bundle() {
        let bundle = EvidenceBundle::from_outcomes(Vec::new());
        assert!(bundle.is_empty());
        assert_eq!(bundle.into_parts(), (String::new(), Vec::new()));
    }

    #[test]
    fn test_source_list_markdown() {
        let bundle = EvidenceBundle::from_outcomes(vec![
            extracted("https://www.who.int/flu", "x"),
            extracted("https://medlineplus.gov/flu.html", "y"),
        ]);
        assert_eq!(
            bundle.source_list_markdown(),
            "- [https://www.who.int/flu](https://www.who.int/flu)\n\
             - [https://medlineplus.gov/flu.html](https://medlineplus.gov/flu.html)"
        );
    }
}
