//! Nearby pharmacy lookup with rate-limit backoff.
//!
//! The search service rate-limits aggressively, so the lookup retries a
//! bounded number of times with a linearly growing pause. Every failure mode
//! ends in an empty list; callers cannot and need not tell "nothing found"
//! from "gave up".

use crate::search::SearchEngine;
use crate::types::PharmacyEntry;
use async_trait::async_trait;
use medassist_core::PharmacySettings;
use std::sync::Arc;
use std::time::Duration;

/// Pauses between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `Sleeper` backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Finds pharmacies near a free-text location.
pub struct PharmacyLocator {
    search: Arc<dyn SearchEngine>,
    sleeper: Arc<dyn Sleeper>,
    settings: PharmacySettings,
}

impl PharmacyLocator {
    pub fn new(search: Arc<dyn SearchEngine>, settings: PharmacySettings) -> Self {
        Self::with_sleeper(search, Arc::new(TokioSleeper), settings)
    }

    pub fn with_sleeper(
        search: Arc<dyn SearchEngine>,
        sleeper: Arc<dyn Sleeper>,
        settings: PharmacySettings,
    ) -> Self {
        Self {
            search,
            sleeper,
            settings,
        }
    }

    pub fn settings(&self) -> &PharmacySettings {
        &self.settings
    }

    /// Look up pharmacies using the configured retry policy.
    pub async fn locate(&self, location: &str) -> Vec<PharmacyEntry> {
        self.locate_with(
            location,
            self.settings.max_retries,
            self.settings.base_delay_secs,
        )
        .await
    }

    /// Look up pharmacies near `location`.
    ///
    /// Makes at most `max_retries` attempts. After a rate-limited attempt
    /// `n` (0-based) it waits `base_delay * (n + 1)` seconds; any other error
    /// stops immediately. Returns an empty list on failure.
    pub async fn locate_with(
        &self,
        location: &str,
        max_retries: u32,
        base_delay: f64,
    ) -> Vec<PharmacyEntry> {
        let query = format!("pharmacies near {}", location);

        for attempt in 0..max_retries {
            match self.search.text(&query, self.settings.max_results).await {
                Ok(results) => {
                    let entries: Vec<PharmacyEntry> = results
                        .into_iter()
                        .filter(|r| !r.url.is_empty())
                        .map(|r| PharmacyEntry {
                            name: r.title,
                            link: r.url,
                        })
                        .collect();
                    tracing::info!(
                        location = %location,
                        count = entries.len(),
                        attempt = attempt + 1,
                        "Pharmacy lookup succeeded"
                    );
                    return entries;
                }
                Err(e) if e.is_rate_limited() => {
                    let delay = backoff_delay(base_delay, attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries,
                        delay_secs = delay.as_secs_f64(),
                        "Pharmacy search rate-limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Pharmacy search failed");
                    break;
                }
            }
        }

        Vec::new()
    }
}

/// Linear backoff: `base_delay * (attempt + 1)` seconds.
fn backoff_delay(base_delay: f64, attempt: u32) -> Duration {
    let secs = base_delay * f64::from(attempt + 1);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
