//! Chat command handler.
//!
//! Reads one condition per line from stdin and answers each on the same
//! session, so follow-up questions see the earlier answers.

use super::render;
use clap::Args;
use medassist_core::{config::AppConfig, AppResult};
use medassist_rag::Advisor;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

/// Interactive consultation that remembers earlier answers
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Location to search for pharmacies after each answer
    #[arg(short, long)]
    pub location: Option<String>,

    /// Wait for full answers instead of streaming them
    #[arg(long)]
    pub no_stream: bool,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        config.validate()?;
        let mut advisor = Advisor::from_config(config)?;
        let session_id = Uuid::new_v4().to_string();

        println!("Enter a medical condition per line. Type 'exit' or press Ctrl-D to quit.");

        let result = self.run(&mut advisor, &session_id).await;
        advisor.end_session(&session_id);
        result
    }

    async fn run(&self, advisor: &mut Advisor, session_id: &str) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            let condition = line.trim();
            if condition.is_empty() {
                continue;
            }
            if condition.eq_ignore_ascii_case("exit") || condition.eq_ignore_ascii_case("quit") {
                break;
            }

            render::advice_turn(advisor, session_id, condition, !self.no_stream).await?;

            if let Some(pharmacies) = advisor.lookup_optional(self.location.as_deref()).await {
                render::print_pharmacies(&pharmacies)?;
            }
            println!();
        }

        Ok(())
    }
}
