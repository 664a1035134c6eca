//! Knowledge management for the troubleshooting assistant.
//!
//! Local-first storage using SQLite and embeddings:
//! - per-base document indexes built by [`learn`] and queried through
//!   [`DocumentIndex`]
//! - the question cache ([`QuestionIndex`]) and answer store
//!   ([`AnswerStore`]) shared by every workflow invocation

pub mod answers;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod questions;
pub mod store;
pub mod types;
pub mod vector;

pub use answers::SqliteAnswerStore;
pub use index::SqliteDocumentIndex;
pub use questions::SqliteQuestionIndex;
pub use store::{AnswerStore, DocumentIndex, QuestionIndex};
pub use types::{
    BaseStats, CacheStats, CandidateMatch, KnowledgeBaseConfig, KnowledgeChunk, KnowledgeSource,
    LearnOptions, LearnStats, RetrievedPassage, StoredAnswer,
};

use chrono::Utc;
use embeddings::{create_provider, EmbeddingProvider};
use parser::ContentType;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};
use troubleshooter_core::{AppError, AppResult, EmbeddingSettings};
use walkdir::WalkDir;

/// Timeout for fetching a URL during ingestion.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Learn from files and URLs and populate a knowledge base.
///
/// Unreadable sources are skipped and reported in
/// [`LearnStats::failed_sources`]; embedding or index failures abort.
pub async fn learn(
    workspace: &Path,
    options: LearnOptions,
    embedding: &EmbeddingSettings,
) -> AppResult<LearnStats> {
    let start = Instant::now();

    tracing::info!("Starting learn operation for base '{}'", options.base_name);

    let index_path = config::get_index_path(workspace, &options.base_name);
    if options.reset && index_path.exists() {
        tracing::info!("Resetting knowledge base '{}'", options.base_name);
        std::fs::remove_file(&index_path)?;
        let config_path = config::get_config_path(workspace, &options.base_name);
        if config_path.exists() {
            std::fs::remove_file(&config_path)?;
        }
    }

    let mut base_config = config::load_config(workspace, &options.base_name, embedding)?;
    if let Some(size) = options.chunk_size {
        base_config.chunk_size = size;
    }
    if let Some(overlap) = options.chunk_overlap {
        base_config.chunk_overlap = overlap;
    }

    let embedder = create_provider(&base_config.embedding)?;
    let conn = index::init_index(&index_path)?;

    let mut stats = LearnStats::default();

    for path in &options.paths {
        if path.is_file() {
            ingest_file(&conn, embedder.as_ref(), &base_config, path, &mut stats).await?;
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && should_include(entry_path, &options) {
                    ingest_file(&conn, embedder.as_ref(), &base_config, entry_path, &mut stats)
                        .await?;
                }
            }
        } else {
            tracing::warn!("Skipping missing path: {:?}", path);
            stats.failed_sources.push(path.to_string_lossy().to_string());
        }
    }

    if !options.urls.is_empty() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Knowledge(format!("Failed to create HTTP client: {}", e)))?;

        for url in &options.urls {
            match fetch_url(&client, url).await {
                Ok((text, content_type)) => {
                    ingest_text(
                        &conn,
                        embedder.as_ref(),
                        &base_config,
                        url,
                        content_type,
                        &text,
                        &mut stats,
                    )
                    .await?;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    stats.failed_sources.push(url.clone());
                }
            }
        }
    }

    config::save_config(workspace, &base_config)?;

    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Learn operation completed: {} sources, {} chunks ({} duplicates skipped), {} bytes in {:.2}s",
        stats.sources_count,
        stats.chunks_count,
        stats.duplicate_chunks,
        stats.bytes_processed,
        stats.duration_secs
    );

    Ok(stats)
}

async fn ingest_file(
    conn: &Connection,
    embedder: &dyn EmbeddingProvider,
    base_config: &KnowledgeBaseConfig,
    path: &Path,
    stats: &mut LearnStats,
) -> AppResult<()> {
    let locator = path.to_string_lossy().to_string();
    match parser::parse_file(path) {
        Ok(text) => {
            ingest_text(
                conn,
                embedder,
                base_config,
                &locator,
                ContentType::from_path(path),
                &text,
                stats,
            )
            .await
        }
        Err(e) => {
            tracing::warn!("Skipping {}: {}", locator, e);
            stats.failed_sources.push(locator);
            Ok(())
        }
    }
}

/// Chunk, embed and insert one source's text.
async fn ingest_text(
    conn: &Connection,
    embedder: &dyn EmbeddingProvider,
    base_config: &KnowledgeBaseConfig,
    locator: &str,
    content_type: ContentType,
    text: &str,
    stats: &mut LearnStats,
) -> AppResult<()> {
    let source = KnowledgeSource {
        id: uuid::Uuid::new_v4().to_string(),
        locator: locator.to_string(),
        content_type: content_type.as_str().to_string(),
        learned_at: Utc::now(),
        size_bytes: text.len() as u64,
    };

    let candidates = chunker::chunk_text(
        &source.id,
        text,
        base_config.chunk_size as usize,
        base_config.chunk_overlap as usize,
    );
    if candidates.is_empty() {
        tracing::warn!("No text extracted from {}", locator);
        stats.failed_sources.push(locator.to_string());
        return Ok(());
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    index::insert_source(conn, &source)?;

    let mut inserted = 0u32;
    for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
        let chunk = KnowledgeChunk {
            id: uuid::Uuid::new_v4().to_string(),
            content_hash: chunker::content_hash(&candidate.text),
            source_id: candidate.source_id,
            position: candidate.position,
            text: candidate.text,
            embedding: Some(embedding),
            metadata: candidate.metadata,
        };

        if index::insert_chunk(conn, &chunk)? {
            inserted += 1;
        } else {
            stats.duplicate_chunks += 1;
        }
    }

    tracing::debug!("Processed {}: {} chunks, {} bytes", locator, inserted, source.size_bytes);

    stats.sources_count += 1;
    stats.chunks_count += inserted;
    stats.bytes_processed += source.size_bytes;
    Ok(())
}

/// Fetch a URL and extract its text.
async fn fetch_url(client: &reqwest::Client, url: &str) -> AppResult<(String, ContentType)> {
    tracing::debug!("Fetching {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Knowledge(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(AppError::Knowledge(format!(
            "Fetching {} returned {}",
            url,
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ContentType::from_mime)
        .unwrap_or(ContentType::Unknown);

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Knowledge(format!("Failed to read body of {}: {}", url, e)))?;

    Ok((parser::extract_text(&body, content_type)?, content_type))
}

/// Check if a file should be included based on patterns.
fn should_include(path: &Path, options: &LearnOptions) -> bool {
    let path_str = path.to_string_lossy();

    if options.exclude.iter().any(|p| path_str.contains(p.as_str())) {
        return false;
    }

    options.include.is_empty() || options.include.iter().any(|p| path_str.contains(p.as_str()))
}

/// Open a base's document index with the embedding provider it was built with.
pub fn open_document_index(
    workspace: &Path,
    base_name: &str,
    embedding: &EmbeddingSettings,
) -> AppResult<SqliteDocumentIndex> {
    let base_config = config::load_config(workspace, base_name, embedding)?;
    let embedder = create_provider(&base_config.embedding)?;
    SqliteDocumentIndex::open(&config::get_index_path(workspace, base_name), embedder)
}

/// Open the workspace question index.
pub fn open_question_index(
    workspace: &Path,
    embedding: &EmbeddingSettings,
) -> AppResult<SqliteQuestionIndex> {
    let embedder = create_provider(embedding)?;
    SqliteQuestionIndex::open(&config::get_question_index_path(workspace), embedder)
}

/// Open the workspace answer store.
pub fn open_answer_store(workspace: &Path) -> AppResult<SqliteAnswerStore> {
    SqliteAnswerStore::open(&config::get_answer_store_path(workspace))
}

/// Search a knowledge base directly, without the answer workflow.
pub async fn search(
    workspace: &Path,
    base_name: &str,
    query: &str,
    top_k: usize,
    embedding: &EmbeddingSettings,
) -> AppResult<Vec<RetrievedPassage>> {
    tracing::info!("Searching knowledge base '{}' for: {}", base_name, query);

    let index = open_document_index(workspace, base_name, embedding)?;
    let passages = index.similarity_search(query, top_k).await?;

    if let (Some(first), Some(last)) = (passages.first(), passages.last()) {
        tracing::debug!(
            "Retrieved {} passages (top score: {:.3}, lowest: {:.3})",
            passages.len(),
            first.score,
            last.score
        );
    }

    Ok(passages)
}

/// Clean (reset) a knowledge base.
pub fn clean(workspace: &Path, base_name: &str) -> AppResult<()> {
    tracing::info!("Cleaning knowledge base '{}'", base_name);

    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    let conn = index::init_index(&index_path)?;
    index::reset_index(&conn)?;

    tracing::info!("Knowledge base '{}' cleaned", base_name);
    Ok(())
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    let conn = index::init_index(&index_path)?;
    let (sources_count, chunks_count) = index::get_stats(&conn)?;
    let last_learn_at = index::last_learned_at(&conn)?;
    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        sources_count,
        chunks_count,
        db_size_bytes,
        last_learn_at,
    })
}

/// Counts for the question cache and answer store.
pub async fn cache_stats(
    questions: &dyn QuestionIndex,
    answers: &dyn AnswerStore,
) -> AppResult<CacheStats> {
    Ok(CacheStats {
        questions_count: questions.len().await? as u32,
        answers_count: answers.len().await? as u32,
    })
}
