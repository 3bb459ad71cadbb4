//! Advise command handler.
//!
//! One consultation: evidence-grounded advice for a condition and, when a
//! location is given, nearby pharmacies.

use super::render;
use clap::Args;
use medassist_core::{config::AppConfig, AppResult};
use medassist_rag::Advisor;
use uuid::Uuid;

/// Get advice for a condition, optionally with nearby pharmacies
#[derive(Args, Debug)]
pub struct AdviseCommand {
    /// Medical condition (e.g., "flu")
    pub condition: String,

    /// Location to search for pharmacies (e.g., "Delhi")
    #[arg(short, long)]
    pub location: Option<String>,

    /// Wait for the full answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AdviseCommand {
    /// Execute the advise command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing advise command");
        tracing::debug!("Advise command options: {:?}", self);

        config.validate()?;
        let mut advisor = Advisor::from_config(config)?;
        let session_id = Uuid::new_v4().to_string();

        let result = self.run(&mut advisor, &session_id).await;
        advisor.end_session(&session_id);
        result
    }

    async fn run(&self, advisor: &mut Advisor, session_id: &str) -> AppResult<()> {
        if self.json {
            let consultation = advisor
                .consult(session_id, &self.condition, self.location.as_deref())
                .await?;
            return render::print_json(&consultation);
        }

        render::advice_turn(advisor, session_id, &self.condition, !self.no_stream).await?;

        if let Some(pharmacies) = advisor.lookup_optional(self.location.as_deref()).await {
            render::print_pharmacies(&pharmacies)?;
        }

        Ok(())
    }
}
