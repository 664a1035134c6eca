//! Prompt-driven model calls shared by every workflow node.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use troubleshooter_core::{AppResult, WorkflowSettings};
use troubleshooter_llm::{LlmClient, LlmRequest};
use troubleshooter_prompt::{build_prompt, BuiltPrompt, PromptLibrary};

use crate::call::{retry_read, with_timeout};
use crate::judgment::Judgment;

/// Renders a prompt from the library and sends it to the model under the
/// configured time budget.
#[derive(Clone)]
pub struct ModelRunner {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompts: PromptLibrary,
    timeout: Duration,
    read_retries: u32,
}

impl ModelRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompts: PromptLibrary,
        settings: &WorkflowSettings,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            prompts,
            timeout: Duration::from_secs(settings.timeout_secs),
            read_retries: settings.read_retries,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn read_retries(&self) -> u32 {
        self.read_retries
    }

    /// Run a generation prompt once and return the trimmed model text.
    pub async fn generate(&self, prompt_id: &str, variables: HashMap<String, String>) -> AppResult<String> {
        let request = self.request(prompt_id, variables)?;
        let response = with_timeout(prompt_id, self.timeout, self.llm.complete(&request)).await?;
        tracing::debug!(
            "{} returned {} bytes from {}",
            prompt_id,
            response.content.len(),
            response.model
        );
        Ok(response.content.trim().to_string())
    }

    /// Run a yes/no classifier prompt.
    ///
    /// Classification is a read, so it is retried on failure.
    pub async fn classify(&self, prompt_id: &str, variables: HashMap<String, String>) -> AppResult<Judgment> {
        let request = self.request(prompt_id, variables)?;
        let response = retry_read(prompt_id, self.timeout, self.read_retries, || {
            self.llm.complete(&request)
        })
        .await?;

        let judgment = Judgment::parse(&response.content);
        tracing::debug!("{} -> {:?} (raw: {:?})", prompt_id, judgment, response.content.trim());
        Ok(judgment)
    }

    fn request(&self, prompt_id: &str, variables: HashMap<String, String>) -> AppResult<LlmRequest> {
        let definition = self.prompts.get(prompt_id)?;
        let built = build_prompt(definition, variables)?;
        Ok(to_request(built, &self.model))
    }
}

fn to_request(built: BuiltPrompt, model: &str) -> LlmRequest {
    let sampling = built.metadata.sampling;
    let mut request = LlmRequest::new(built.user, model);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }
    if let Some(temperature) = sampling.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = sampling.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}

/// Build a variable map from string pairs.
pub fn vars<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
