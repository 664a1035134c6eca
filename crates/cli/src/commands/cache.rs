//! Cache command handler.
//!
//! Direct administration of the question index and answer store.

use clap::{Args, Subcommand};
use troubleshooter_agent::store_pair;
use troubleshooter_core::{config::AppConfig, AppError, AppResult};
use troubleshooter_knowledge::{cache_stats, open_answer_store, open_question_index, AnswerStore};

/// Question cache administration
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Add a question/answer pair
    Add(CacheAddCommand),
    /// Show a stored answer
    Get(CacheGetCommand),
    /// Show cache statistics
    Stats(CacheStatsCommand),
}

/// Add a question/answer pair
#[derive(Args, Debug)]
pub struct CacheAddCommand {
    /// Question text
    #[arg(short, long)]
    pub question: String,

    /// Answer text
    #[arg(short, long)]
    pub answer: String,

    /// Source link for the answer (repeatable)
    #[arg(short, long)]
    pub link: Vec<String>,
}

impl CacheAddCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if self.question.trim().is_empty() || self.answer.trim().is_empty() {
            return Err(AppError::Config(
                "Both --question and --answer are required".to_string(),
            ));
        }

        let questions = open_question_index(&config.workspace, &config.embedding)?;
        let answers = open_answer_store(&config.workspace)?;

        let id = store_pair(
            &questions,
            &answers,
            self.question.trim(),
            self.answer.trim(),
            &self.link,
        )
        .await?;

        println!("Cached answer {}", id);
        Ok(())
    }
}

/// Show a stored answer
#[derive(Args, Debug)]
pub struct CacheGetCommand {
    /// Answer identifier
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CacheGetCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let answers = open_answer_store(&config.workspace)?;
        let stored = answers
            .get(&self.id)
            .await?
            .ok_or_else(|| AppError::Store(format!("No answer with id {}", self.id)))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stored)?);
        } else {
            println!("Question: {}", stored.question);
            println!("Answer: {}", stored.answer);
            if !stored.links.is_empty() {
                println!("Links:");
                for link in &stored.links {
                    println!("- {}", link);
                }
            }
            println!("Created: {}", stored.created_at);
        }

        Ok(())
    }
}

/// Show cache statistics
#[derive(Args, Debug)]
pub struct CacheStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CacheStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let questions = open_question_index(&config.workspace, &config.embedding)?;
        let answers = open_answer_store(&config.workspace)?;
        let stats = cache_stats(&questions, &answers).await?;

        if self.json {
            let output = serde_json::json!({
                "questionsCount": stats.questions_count,
                "answersCount": stats.answers_count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Question cache:");
            println!("  Questions: {}", stats.questions_count);
            println!("  Answers: {}", stats.answers_count);
        }

        Ok(())
    }
}

impl CacheCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing cache command");
        match &self.action {
            CacheAction::Add(cmd) => cmd.execute(config).await,
            CacheAction::Get(cmd) => cmd.execute(config).await,
            CacheAction::Stats(cmd) => cmd.execute(config).await,
        }
    }
}
