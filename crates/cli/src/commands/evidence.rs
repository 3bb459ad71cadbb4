//! Evidence command handler.
//!
//! Runs only the trusted-source retrieval for a condition; no LLM is involved.

use super::render;
use clap::Args;
use medassist_core::{config::AppConfig, AppResult};
use medassist_rag::{source_list_markdown, DuckDuckGoSearch, EvidenceRetriever, HttpPageFetcher};
use std::sync::Arc;

/// Show the trusted-source evidence retrieved for a condition
#[derive(Args, Debug)]
pub struct EvidenceCommand {
    /// Medical condition (e.g., "flu")
    pub condition: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvidenceCommand {
    /// Execute the evidence command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing evidence command");
        tracing::debug!("Evidence command options: {:?}", self);

        let search = Arc::new(DuckDuckGoSearch::new(&config.search)?);
        let fetcher = Arc::new(HttpPageFetcher::new(&config.search.user_agent)?);
        let retriever = EvidenceRetriever::new(search, fetcher, config.retrieval.clone());

        let bundle = retriever.retrieve(&self.condition).await;

        if self.json {
            let output = serde_json::json!({
                "condition": self.condition,
                "query": retriever.build_query(&self.condition),
                "text": bundle.text(),
                "excerpts": bundle.excerpts(),
                "sources": bundle.sources,
            });
            return render::print_json(&output);
        }

        if bundle.is_empty() {
            println!("{}", render::NO_DATA_WARNING);
            return Ok(());
        }

        for (excerpt, source) in bundle.excerpts().iter().zip(&bundle.sources) {
            println!("## {}\n", source);
            println!("{}\n", excerpt);
        }
        println!("{}", source_list_markdown(&bundle.sources));

        Ok(())
    }
}
