//! Retrieval-augmented medical advice.
//!
//! This crate gathers trusted-source evidence from the web and turns it into
//! grounded LLM advice:
//! - **Search**: DuckDuckGo HTML search behind the `SearchEngine` trait
//! - **Evidence**: fetch each hit, keep its paragraph text, cap it per page
//! - **Pharmacies**: nearby pharmacy lookup with rate-limit backoff
//! - **Advisor**: prompt assembly and per-session chat dispatch
//!
//! # Example
//! ```no_run
//! use medassist_core::AppConfig;
//! use medassist_rag::{AdviceOutcome, Advisor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let mut advisor = Advisor::from_config(&config)?;
//!
//! if let AdviceOutcome::Answered { answer, sources } = advisor.advise("local", "flu").await? {
//!     println!("{}\n{:?}", answer, sources);
//! }
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod fetch;
pub mod pharmacy;
pub mod search;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use advisor::{AdviceOutcome, Advisor, Consultation};
pub use error::{FetchError, SearchError, RATE_LIMIT_MARKER};
pub use evidence::EvidenceRetriever;
pub use extract::{extract_paragraph_text, truncate_chars};
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use pharmacy::{PharmacyLocator, Sleeper, TokioSleeper};
pub use search::{DuckDuckGoSearch, SearchEngine};
pub use types::{source_list_markdown, EvidenceBundle, PageOutcome, PharmacyEntry, SearchResult};
