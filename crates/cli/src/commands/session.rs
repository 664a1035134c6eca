//! Wiring shared by the commands that talk to the model.

use std::sync::Arc;

use troubleshooter_agent::{ModelRunner, Workflow};
use troubleshooter_core::{config::AppConfig, AppError, AppResult};
use troubleshooter_knowledge::{
    config::base_exists, open_answer_store, open_document_index, open_question_index,
};
use troubleshooter_llm::create_client;
use troubleshooter_prompt::PromptLibrary;

/// Build a model runner from the active provider and the workspace prompts.
pub fn model_runner(config: &AppConfig) -> AppResult<ModelRunner> {
    config.validate()?;

    let provider_config = config.get_provider_config(&config.provider);
    let endpoint = provider_config.and_then(|pc| pc.endpoint());
    let timeout = provider_config.and_then(|pc| pc.timeout());
    let api_key = config.resolve_api_key(&config.provider);

    let client = create_client(&config.provider, endpoint, api_key.as_deref(), timeout)?;
    let prompts = PromptLibrary::load(&config.workspace)?;

    let provider = client.provider_name().to_string();
    let runner = ModelRunner::new(client, &config.model, prompts, &config.workflow);
    tracing::debug!("Using {} model {}", provider, runner.model());
    Ok(runner)
}

/// Assemble the answer workflow over a document base and the workspace cache.
pub fn workflow(config: &AppConfig, runner: ModelRunner, base: &str) -> AppResult<Workflow> {
    if !base_exists(&config.workspace, base) {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist. Use 'troubleshooter knowledge learn {} --path <docs>' to create it.",
            base, base
        )));
    }

    let documents = open_document_index(&config.workspace, base, &config.embedding)?;
    let questions = open_question_index(&config.workspace, &config.embedding)?;
    let answers = open_answer_store(&config.workspace)?;

    Ok(Workflow::new(
        runner,
        Arc::new(documents),
        Arc::new(questions),
        Arc::new(answers),
        config.workflow.clone(),
    ))
}
