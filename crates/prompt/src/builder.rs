//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use troubleshooter_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// Both the system and user templates are rendered with the same variables.
/// Missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use troubleshooter_prompt::{build_prompt, builtin_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt("relevance.classify")?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "MATLAB crashes on startup".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    let system = match &definition.system {
        Some(template) => Some(render_template(template, &variables)?),
        None => None,
    };
    let user = render_template(&definition.template, &variables)?;

    tracing::debug!(
        "Built prompt {} (system: {} bytes, user: {} bytes)",
        definition.id,
        system.as_ref().map(|s| s.len()).unwrap_or(0),
        user.len()
    );

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        definition.sampling.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
