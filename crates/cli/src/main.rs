//! Troubleshooter CLI
//!
//! Main entry point for the `troubleshooter` command-line tool: a MATLAB and
//! Simulink troubleshooting assistant backed by a question cache and local
//! document retrieval.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, CacheCommand, KnowledgeCommand, PromptsCommand, SuggestCommand};
use std::path::PathBuf;
use troubleshooter_core::{config::AppConfig, logging, AppResult};

/// Troubleshooter - answers MATLAB and Simulink troubleshooting questions
#[derive(Parser, Debug)]
#[command(name = "troubleshooter")]
#[command(about = "MATLAB and Simulink troubleshooting assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TROUBLESHOOTER_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TROUBLESHOOTER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "TROUBLESHOOTER_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "TROUBLESHOOTER_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a troubleshooting question
    Ask(AskCommand),

    /// Document knowledge base management
    Knowledge(KnowledgeCommand),

    /// Question cache administration
    Cache(CacheCommand),

    /// Autocomplete a partially typed question
    Suggest(SuggestCommand),

    /// List built-in and workspace prompts
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Troubleshooter CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Knowledge(_) => "knowledge",
        Commands::Cache(_) => "cache",
        Commands::Suggest(_) => "suggest",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Knowledge(cmd) => cmd.execute(&config).await,
        Commands::Cache(cmd) => cmd.execute(&config).await,
        Commands::Suggest(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
