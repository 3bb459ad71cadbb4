//! Pharmacies command handler.
//!
//! Runs only the pharmacy lookup, with the retry policy adjustable per call.

use super::render;
use clap::Args;
use medassist_core::{config::AppConfig, AppError, AppResult};
use medassist_rag::{DuckDuckGoSearch, PharmacyLocator};
use std::sync::Arc;

/// Find pharmacies near a location
#[derive(Args, Debug)]
pub struct PharmaciesCommand {
    /// Location (e.g., "Delhi")
    pub location: String,

    /// Maximum search attempts when rate-limited (default: from config)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base backoff delay in seconds (default: from config)
    #[arg(long)]
    pub delay: Option<f64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PharmaciesCommand {
    /// Execute the pharmacies command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing pharmacies command");
        tracing::debug!("Pharmacies command options: {:?}", self);

        let location = self.location.trim();
        if location.is_empty() {
            return Err(AppError::Other("Location must not be empty".to_string()));
        }

        let max_retries = self.retries.unwrap_or(config.pharmacy.max_retries);
        let base_delay = self.delay.unwrap_or(config.pharmacy.base_delay_secs);
        if base_delay < 0.0 || !base_delay.is_finite() {
            return Err(AppError::Config(format!(
                "Delay must be a non-negative number, got {}",
                base_delay
            )));
        }

        let search = Arc::new(DuckDuckGoSearch::new(&config.search)?);
        let locator = PharmacyLocator::new(search, config.pharmacy.clone());
        let entries = locator.locate_with(location, max_retries, base_delay).await;

        if self.json {
            let output = serde_json::json!({
                "location": location,
                "pharmacies": entries,
            });
            return render::print_json(&output);
        }

        render::print_pharmacies(&entries)
    }
}
