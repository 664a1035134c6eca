//! LLM provider factory.
//!
//! Resolves a provider name plus optional endpoint and credentials into a
//! shared client handle.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use std::sync::Arc;
use troubleshooter_core::{AppError, AppResult};

/// Local models are slow to load on first use.
const OLLAMA_TIMEOUT_SECS: u64 = 120;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenAI-compatible endpoints
/// * `timeout_secs` - Optional per-request HTTP timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing, `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    tracing::debug!("Creating {} client for {}", provider_type.as_str(), base_url);

    match provider_type {
        ProviderType::Ollama => {
            let client = OllamaClient::with_base_url(
                base_url,
                timeout_secs.unwrap_or(OLLAMA_TIMEOUT_SECS),
            )?;
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            Ok(Arc::new(OpenAiClient::new(base_url, key, timeout_secs)?))
        }
    }
}
