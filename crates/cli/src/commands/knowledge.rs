//! Knowledge command handler.
//!
//! Manages the document knowledge bases the retrieval composer reads from.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use troubleshooter_core::{config::AppConfig, AppResult};
use troubleshooter_knowledge::LearnOptions;

/// Document knowledge base management
#[derive(Args, Debug)]
pub struct KnowledgeCommand {
    #[command(subcommand)]
    pub action: KnowledgeAction,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Learn from sources (files, directories, URLs)
    Learn(KnowledgeLearnCommand),
    /// Search the knowledge base without generating an answer
    Search(KnowledgeSearchCommand),
    /// Clean up knowledge base
    Clean(KnowledgeCleanCommand),
    /// Show knowledge base statistics
    Stats(KnowledgeStatsCommand),
}

/// Learn from sources
#[derive(Args, Debug)]
pub struct KnowledgeLearnCommand {
    /// Knowledge base name
    pub base: String,

    /// Paths to learn from
    #[arg(long)]
    pub path: Vec<PathBuf>,

    /// URLs to fetch and learn
    #[arg(long)]
    pub url: Vec<String>,

    /// Only learn paths containing one of these substrings
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths containing any of these substrings
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Reset base before learning
    #[arg(long)]
    pub reset: bool,

    /// Chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Overlap between consecutive chunks in characters
    #[arg(long)]
    pub chunk_overlap: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeLearnCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge learn command for base '{}'", self.base);

        let options = LearnOptions {
            base_name: self.base.clone(),
            paths: self.path.clone(),
            urls: self.url.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            reset: self.reset,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        };

        let stats = troubleshooter_knowledge::learn(&config.workspace, options, &config.embedding).await?;

        if self.json {
            let output = serde_json::json!({
                "base": self.base,
                "sourcesCount": stats.sources_count,
                "chunksCount": stats.chunks_count,
                "duplicateChunks": stats.duplicate_chunks,
                "failedSources": stats.failed_sources,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Learned {} sources ({} chunks, {} bytes) in {:.2}s",
                stats.sources_count, stats.chunks_count, stats.bytes_processed, stats.duration_secs
            );
            if stats.duplicate_chunks > 0 {
                println!("Skipped {} duplicate chunks", stats.duplicate_chunks);
            }
            for failed in &stats.failed_sources {
                println!("Failed: {}", failed);
            }
        }

        Ok(())
    }
}

/// Search a knowledge base
#[derive(Args, Debug)]
pub struct KnowledgeSearchCommand {
    /// Knowledge base name
    pub base: String,

    /// Query text
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge search command for base '{}'", self.base);

        let passages = troubleshooter_knowledge::search(
            &config.workspace,
            &self.base,
            &self.query,
            self.top_k,
            &config.embedding,
        )
        .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&passages)?);
        } else if passages.is_empty() {
            println!("No passages found");
        } else {
            for (i, passage) in passages.iter().enumerate() {
                println!("[{}] {:.3} {}", i + 1, passage.score, passage.locator);
                println!("{}", passage.text.trim());
                println!();
            }
        }

        Ok(())
    }
}

/// Clean knowledge base
#[derive(Args, Debug)]
pub struct KnowledgeCleanCommand {
    /// Knowledge base name
    pub base: String,
}

impl KnowledgeCleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge clean command for base '{}'", self.base);

        troubleshooter_knowledge::clean(&config.workspace, &self.base)?;

        println!("Knowledge base '{}' cleaned", self.base);

        Ok(())
    }
}

/// Show knowledge base stats
#[derive(Args, Debug)]
pub struct KnowledgeStatsCommand {
    /// Knowledge base name
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge stats command for base '{}'", self.base);

        let stats = troubleshooter_knowledge::stats(&config.workspace, &self.base)?;

        if self.json {
            let output = serde_json::json!({
                "base": stats.base_name,
                "sourcesCount": stats.sources_count,
                "chunksCount": stats.chunks_count,
                "dbSizeBytes": stats.db_size_bytes,
                "lastLearnAt": stats.last_learn_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Knowledge base: {}", stats.base_name);
            println!("  Sources: {}", stats.sources_count);
            println!("  Chunks: {}", stats.chunks_count);
            println!("  DB size: {} bytes", stats.db_size_bytes);
            if let Some(last_learn) = stats.last_learn_at {
                println!("  Last learn: {}", last_learn);
            }
        }

        Ok(())
    }
}

impl KnowledgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KnowledgeAction::Learn(cmd) => cmd.execute(config).await,
            KnowledgeAction::Search(cmd) => cmd.execute(config).await,
            KnowledgeAction::Clean(cmd) => cmd.execute(config).await,
            KnowledgeAction::Stats(cmd) => cmd.execute(config).await,
        }
    }
}
