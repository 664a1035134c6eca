//! Prompts command handler.

use clap::Args;
use troubleshooter_core::{config::AppConfig, AppResult};
use troubleshooter_prompt::{list_prompts, load_prompt, loader::prompts_dir};

/// List the prompts the workflow uses and where each comes from
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let dir = prompts_dir(&config.workspace);
        let mut rows = Vec::new();
        for id in list_prompts(&config.workspace)? {
            let overridden = dir.join(format!("{}.yml", id)).exists();
            let title = load_prompt(&config.workspace, &id)?.title;
            rows.push((id, title, overridden));
        }

        if self.json {
            let output: Vec<_> = rows
                .iter()
                .map(|(id, title, overridden)| {
                    serde_json::json!({
                        "id": id,
                        "title": title,
                        "source": if *overridden { "workspace" } else { "builtin" },
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for (id, title, overridden) in &rows {
                let source = if *overridden { "workspace" } else { "builtin" };
                println!("{:<20} {:<10} {}", id, source, title);
            }
        }

        Ok(())
    }
}
