//! Knowledge base configuration and on-disk layout.
//!
//! ```text
//! .troubleshooter/
//!   knowledge/<base>/config.yaml
//!   knowledge/<base>/index.sqlite
//!   cache/questions.sqlite
//!   cache/answers.sqlite
//! ```

use crate::types::KnowledgeBaseConfig;
use std::fs;
use std::path::{Path, PathBuf};
use troubleshooter_core::config::STATE_DIR;
use troubleshooter_core::{AppError, AppResult, EmbeddingSettings};

/// Load knowledge base configuration.
///
/// Loads from `.troubleshooter/knowledge/<base>/config.yaml` if it exists,
/// otherwise returns a default config using `embedding`.
pub fn load_config(
    workspace: &Path,
    base_name: &str,
    embedding: &EmbeddingSettings,
) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, base_name);

    if !config_path.exists() {
        tracing::debug!(
            "Using default knowledge base config for '{}' (no config file found)",
            base_name
        );
        return Ok(KnowledgeBaseConfig::new(base_name, embedding.clone()));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.name = base_name.to_string();

    if &config.embedding != embedding {
        tracing::debug!(
            "Base '{}' was built with {} ({} dims); using that instead of the configured {}",
            base_name,
            config.embedding.provider,
            config.embedding.dimensions,
            embedding.provider
        );
    }

    Ok(config)
}

/// Save knowledge base configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge base config for '{}'", config.name);
    Ok(())
}

/// Root of all knowledge bases.
pub fn get_knowledge_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("knowledge")
}

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    get_knowledge_dir(workspace).join(base_name)
}

/// Get the path to a base's config file.
pub fn get_config_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("config.yaml")
}

/// Get the SQLite index path for a base.
pub fn get_index_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("index.sqlite")
}

/// Question index path.
pub fn get_question_index_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("cache").join("questions.sqlite")
}

/// Answer store path.
pub fn get_answer_store_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("cache").join("answers.sqlite")
}

/// Whether a base has an index on disk.
pub fn base_exists(workspace: &Path, base_name: &str) -> bool {
    get_index_path(workspace, base_name).exists()
}

/// Names of all bases with an index, sorted.
pub fn list_bases(workspace: &Path) -> Vec<String> {
    let root = get_knowledge_dir(workspace);
    let mut names: Vec<String> = walkdir::WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.path().join("index.sqlite").exists())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "matlab", &EmbeddingSettings::default()).unwrap();

        assert_eq!(config.name, "matlab");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.embedding.provider, "trigram");
    }

    #[test]
    fn test_saved_embedding_wins() {
        let temp = TempDir::new().unwrap();
        let mut config = KnowledgeBaseConfig::new("matlab", EmbeddingSettings::default());
        config.chunk_size = 800;
        save_config(temp.path(), &config).unwrap();

        let configured = EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: None,
        };
        let loaded = load_config(temp.path(), "matlab", &configured).unwrap();
        assert_eq!(loaded.chunk_size, 800);
        assert_eq!(loaded.embedding.provider, "trigram");
    }

    #[test]
    fn test_list_bases_requires_index() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(get_base_dir(temp.path(), "empty")).unwrap();
        fs::create_dir_all(get_base_dir(temp.path(), "matlab")).unwrap();
        fs::write(get_index_path(temp.path(), "matlab"), b"").unwrap();

        assert_eq!(list_bases(temp.path()), vec!["matlab".to_string()]);
        assert!(base_exists(temp.path(), "matlab"));
        assert!(!base_exists(temp.path(), "empty"));
    }
}
