//! Command handlers for the troubleshooter CLI.

pub mod ask;
pub mod cache;
pub mod knowledge;
pub mod prompts;
pub mod session;
pub mod suggest;

pub use ask::AskCommand;
pub use cache::CacheCommand;
pub use knowledge::KnowledgeCommand;
pub use prompts::PromptsCommand;
pub use suggest::SuggestCommand;
