//! Retrieval from search hit to evidence text, across search, fetch and extraction.

use super::stubs::{page_with_paragraphs, StubFetcher, StubSearch};
use crate::evidence::EvidenceRetriever;
use crate::types::SearchResult;
use medassist_core::RetrievalSettings;
use std::sync::Arc;

const MAYO: &str = "https://www.mayoclinic.org/diseases-conditions/flu";
const MEDLINE: &str = "https://medlineplus.gov/flu.html";
const WHO: &str = "https://www.who.int/news-room/fact-sheets/detail/influenza-(seasonal)";

#[tokio::test]
async fn test_flu_evidence_from_three_sources() {
    let long_paragraph = "Influenza spreads easily. ".repeat(150);
    assert!(long_paragraph.chars().count() > 2000);

    let search = StubSearch::new(vec![Ok(vec![
        SearchResult::new("Influenza (flu) - Mayo Clinic", MAYO),
        SearchResult::new("Flu | MedlinePlus", MEDLINE),
        SearchResult::new("Influenza (seasonal)", WHO),
    ])]);
    let fetcher = StubFetcher::new()
        .with_page(MAYO, &page_with_paragraphs(&["Flu is a viral infection.", "It attacks the lungs."]))
        .with_page(MEDLINE, &page_with_paragraphs(&[&long_paragraph]))
        .with_page(WHO, &page_with_paragraphs(&["Seasonal influenza is common."]));

    let retriever = EvidenceRetriever::new(
        Arc::new(search),
        Arc::new(fetcher),
        RetrievalSettings::default(),
    );
    let bundle = retriever.retrieve("flu").await;

    let expected_medline: String = long_paragraph.chars().take(2000).collect();
    let expected = [
        "Flu is a viral infection. It attacks the lungs.",
        expected_medline.as_str(),
        "Seasonal influenza is common.",
    ]
    .join("\n\n");

    assert_eq!(bundle.text(), expected);
    assert_eq!(bundle.sources, vec![MAYO, MEDLINE, WHO]);
    assert_eq!(bundle.len(), bundle.sources.len());
    assert!(bundle.excerpts().iter().all(|e| e.chars().count() <= 2000));
}
