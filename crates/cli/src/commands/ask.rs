//! Ask command handler.
//!
//! Runs a question through the answer workflow.

use clap::Args;
use troubleshooter_agent::{categorize, Answer};
use troubleshooter_core::{config::AppConfig, AppError, AppResult};
use troubleshooter_knowledge::config::base_exists;

use super::session;

/// Answer a troubleshooting question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Knowledge base to retrieve documents from (default: workflow.knowledgeBase)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Pick the knowledge base from the question's troubleshooting category
    #[arg(long, conflicts_with = "base")]
    pub route: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let query = self.query.trim();
        if query.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let runner = session::model_runner(config)?;
        let base = self.resolve_base(config, &runner, query).await;
        tracing::info!("Using knowledge base '{}'", base);

        let workflow = session::workflow(config, runner, &base)?;
        let run = workflow.run(query).await;
        tracing::debug!(
            "Workflow path: {}",
            run.path.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" -> ")
        );

        if self.json {
            let json = serde_json::to_string_pretty(&run.answer)?;
            println!("{}", json);
        } else {
            print_answer(&run.answer);
        }

        Ok(())
    }

    async fn resolve_base(
        &self,
        config: &AppConfig,
        runner: &troubleshooter_agent::ModelRunner,
        query: &str,
    ) -> String {
        if let Some(base) = &self.base {
            return base.clone();
        }

        let default = config.workflow.knowledge_base.clone();
        if !self.route {
            return default;
        }

        match categorize(runner, query).await {
            Ok(Some(category)) => {
                let key = category.knowledge_key();
                if base_exists(&config.workspace, &key) {
                    key
                } else {
                    tracing::warn!(
                        "No knowledge base '{}' for category '{}', using '{}'",
                        key,
                        category,
                        default
                    );
                    default
                }
            }
            Ok(None) => {
                tracing::warn!("Could not categorize question, using '{}'", default);
                default
            }
            Err(e) => {
                tracing::warn!("Categorization failed, using '{}': {}", default, e);
                default
            }
        }
    }
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);

    if let Some(error) = &answer.error {
        tracing::error!("Answer failed: {}", error);
    }

    if !answer.links.is_empty() {
        println!();
        println!("Sources:");
        for link in &answer.links {
            println!("- {}", link);
        }
    }
}
