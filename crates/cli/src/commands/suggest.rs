//! Suggest command handler.

use clap::Args;
use troubleshooter_agent::suggest;
use troubleshooter_core::{config::AppConfig, AppResult};

use super::session;

/// Autocomplete a partially typed question
#[derive(Args, Debug)]
pub struct SuggestCommand {
    /// What has been typed so far
    pub partial: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing suggest command");

        let suggestions = if self.partial.trim().is_empty() {
            Vec::new()
        } else {
            let runner = session::model_runner(config)?;
            suggest(&runner, &self.partial).await?
        };

        if self.json {
            let output = serde_json::json!({ "suggestions": suggestions });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for suggestion in &suggestions {
                println!("{}", suggestion);
            }
        }

        Ok(())
    }
}
