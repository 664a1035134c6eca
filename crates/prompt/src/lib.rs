//! Prompt system for the troubleshooting assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in prompt set with workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, PromptLibrary};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptInputSpec, PromptOutputSpec,
    PromptSampling,
};
