//! Prompt loader for built-in and workspace YAML prompt definitions.
//!
//! Built-in prompts are compiled into the binary. A workspace may override
//! any of them by placing `<id>.yml` under `.troubleshooter/prompts/`.

use crate::types::PromptDefinition;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use troubleshooter_core::config::STATE_DIR;
use troubleshooter_core::{AppError, AppResult};

/// Prompt ids the workflow depends on, with their built-in YAML.
const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        "relevance.classify",
        include_str!("../prompts/relevance.classify.yml"),
    ),
    ("cache.match", include_str!("../prompts/cache.match.yml")),
    ("answer.cached", include_str!("../prompts/answer.cached.yml")),
    ("query.expand", include_str!("../prompts/query.expand.yml")),
    ("answer.rag", include_str!("../prompts/answer.rag.yml")),
    ("answer.general", include_str!("../prompts/answer.general.yml")),
    ("query.category", include_str!("../prompts/query.category.yml")),
    ("query.suggest", include_str!("../prompts/query.suggest.yml")),
];

/// Directory holding workspace prompt overrides.
pub fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, yaml) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown built-in prompt: {}", prompt_id)))?;

    parse_prompt(yaml, &format!("built-in prompt {}", prompt_id))
}

/// Load a prompt definition by ID.
///
/// A workspace override at `.troubleshooter/prompts/<id>.yml` wins over the
/// built-in definition. Unknown ids without an override are an error.
///
/// # Example
/// ```no_run
/// use troubleshooter_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.rag")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        return builtin_prompt(prompt_id);
    }

    tracing::debug!("Loading prompt override from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &format!("{:?}", prompt_file))?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    tracing::info!("Using workspace prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs: built-ins plus workspace overrides, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut ids: BTreeMap<String, ()> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| (id.to_string(), ()))
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.insert(stem.to_string(), ());
                }
            }
        }
    }

    Ok(ids.into_keys().collect())
}

/// Every prompt the workflow uses, resolved once for a workspace.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: BTreeMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// The built-in prompt set with no overrides.
    pub fn builtin() -> AppResult<Self> {
        let mut prompts = BTreeMap::new();
        for (id, _) in BUILTIN_PROMPTS {
            prompts.insert(id.to_string(), builtin_prompt(id)?);
        }
        Ok(Self { prompts })
    }

    /// Built-in prompts with workspace overrides applied.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut prompts = BTreeMap::new();
        for (id, _) in BUILTIN_PROMPTS {
            prompts.insert(id.to_string(), load_prompt(workspace_path, id)?);
        }
        Ok(Self { prompts })
    }

    /// Look up a prompt by ID.
    pub fn get(&self, prompt_id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(prompt_id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt not loaded: {}", prompt_id)))
    }

    /// Replace or add a definition.
    pub fn insert(&mut self, definition: PromptDefinition) {
        self.prompts.insert(definition.id.clone(), definition);
    }
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, body: &str) {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_all_builtins_parse() {
        for (id, _) in BUILTIN_PROMPTS {
            let def = builtin_prompt(id).unwrap();
            assert_eq!(&def.id, id);
        }
    }

    #[test]
    fn test_classifiers_default_to_no() {
        for id in ["relevance.classify", "cache.match"] {
            let def = builtin_prompt(id).unwrap();
            let system = def.system.unwrap();
            assert!(system.contains("If unsure, respond with \"no\""));
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("nope").is_err());
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "answer.general",
            r#"
id: answer.general
title: "Terse"
apiVersion: "1.0"
template: "Reply in one word: {{query}}"
"#,
        );

        let def = load_prompt(temp_dir.path(), "answer.general").unwrap();
        assert_eq!(def.title, "Terse");

        let library = PromptLibrary::load(temp_dir.path()).unwrap();
        assert_eq!(library.get("answer.general").unwrap().title, "Terse");
        assert_eq!(
            library.get("answer.rag").unwrap().title,
            "Retrieval-Augmented Composer"
        );
    }

    #[test]
    fn test_override_with_wrong_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "answer.rag",
            r#"
id: something.else
title: "Wrong"
apiVersion: "1.0"
template: "x"
"#,
        );

        assert!(load_prompt(temp_dir.path(), "answer.rag").is_err());
    }

    #[test]
    fn test_invalid_yaml_override() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "query.expand", "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), "query.expand").is_err());
    }

    #[test]
    fn test_list_prompts_merges_overrides() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "custom.extra",
            "id: custom.extra\ntitle: X\napiVersion: \"1.0\"\ntemplate: x\n",
        );

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), BUILTIN_PROMPTS.len() + 1);
        assert!(prompts.contains(&"custom.extra".to_string()));
        assert!(prompts.contains(&"relevance.classify".to_string()));
    }

    #[test]
    fn test_library_missing_prompt() {
        let library = PromptLibrary::builtin().unwrap();
        assert!(library.get("custom.extra").is_err());
    }
}
