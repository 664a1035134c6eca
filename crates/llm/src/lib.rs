//! LLM integration crate for the troubleshooting assistant.
//!
//! Provides a provider-agnostic completion trait and concrete clients for
//! Ollama and OpenAI-compatible chat endpoints.
//!
//! # Example
//! ```no_run
//! use troubleshooter_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()?;
//! let request = LlmRequest::new("Why does Simulink report an algebraic loop?", "llama3");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
