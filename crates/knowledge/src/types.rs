//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use troubleshooter_core::EmbeddingSettings;

/// Configuration for a knowledge base.
///
/// Saved at `.troubleshooter/knowledge/<base>/config.yaml` on first learn so
/// later searches embed queries with the same provider and dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    pub name: String,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    /// Embedding provider the index was built with
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

fn default_chunk_size() -> u32 {
    500
}

fn default_chunk_overlap() -> u32 {
    100
}

impl KnowledgeBaseConfig {
    /// Default configuration for a named base using the given embedding settings.
    pub fn new(name: impl Into<String>, embedding: EmbeddingSettings) -> Self {
        Self {
            name: name.into(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding,
        }
    }
}

/// A document that was ingested into a base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Unique source identifier
    pub id: String,

    /// File path or URL; becomes the provenance locator of every chunk
    pub locator: String,

    /// Detected content type ("html", "markdown", ...)
    pub content_type: String,

    /// When this source was learned
    pub learned_at: DateTime<Utc>,

    /// Extracted text size in bytes
    pub size_bytes: u64,
}

/// A text chunk with embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source document ID
    pub source_id: String,

    /// Position within source
    pub position: u32,

    /// Text content
    pub text: String,

    /// SHA-256 of the text, used to skip duplicate chunks
    pub content_hash: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Metadata (offsets within the source)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A passage returned by a document index search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text
    pub text: String,

    /// Where the passage came from (URL or file path)
    pub locator: String,

    /// Cosine similarity to the query
    pub score: f32,
}

/// A previously answered question returned by the question index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// The cached question text
    pub question: String,

    /// Identifier of the stored answer
    pub answer_id: String,

    /// Cosine similarity to the query
    pub score: f32,
}

/// An answer held in the answer store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnswer {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Options for the learn operation.
#[derive(Debug, Clone, Default)]
pub struct LearnOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Local paths to learn from
    pub paths: Vec<PathBuf>,

    /// URLs to fetch and learn
    pub urls: Vec<String>,

    /// Include patterns (substring match)
    pub include: Vec<String>,

    /// Exclude patterns (substring match)
    pub exclude: Vec<String>,

    /// Reset the base before learning
    pub reset: bool,

    /// Override the base's chunk size
    pub chunk_size: Option<u32>,

    /// Override the base's chunk overlap
    pub chunk_overlap: Option<u32>,
}

/// Statistics from a learn operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnStats {
    /// Number of sources processed
    pub sources_count: u32,

    /// Number of chunks created
    pub chunks_count: u32,

    /// Chunks skipped because identical text was already indexed
    pub duplicate_chunks: u32,

    /// Sources that could not be read or fetched
    pub failed_sources: Vec<String>,

    /// Total bytes processed
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    /// Base name
    pub base_name: String,

    /// Number of sources
    pub sources_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// Most recent learn timestamp
    pub last_learn_at: Option<DateTime<Utc>>,
}

/// Counts for the question cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub questions_count: u32,
    pub answers_count: u32,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub source_id: String,
    pub position: u32,
    pub text: String,
    pub metadata: serde_json::Value,
}
