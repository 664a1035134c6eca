//! SQLite-backed document index for knowledge chunks.

use crate::embeddings::EmbeddingProvider;
use crate::store::DocumentIndex;
use crate::types::{KnowledgeChunk, KnowledgeSource, RetrievedPassage};
use crate::vector::{bytes_to_embedding, cosine_similarity, embedding_to_bytes, rank_top_k};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use troubleshooter_core::{AppError, AppResult};

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id TEXT PRIMARY KEY,
            locator TEXT NOT NULL,
            content_type TEXT NOT NULL,
            learned_at TEXT NOT NULL,
            size_bytes INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            content_hash TEXT NOT NULL UNIQUE,
            embedding BLOB NOT NULL,
            metadata TEXT,
            FOREIGN KEY (source_id) REFERENCES sources(id)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Insert a source into the index.
pub fn insert_source(conn: &Connection, source: &KnowledgeSource) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sources (id, locator, content_type, learned_at, size_bytes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            source.id,
            source.locator,
            source.content_type,
            source.learned_at.to_rfc3339(),
            source.size_bytes as i64,
        ],
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to insert source: {}", e)))?;

    Ok(())
}

/// Insert a chunk with embedding into the index.
///
/// Returns `false` when a chunk with identical text is already indexed.
pub fn insert_chunk(conn: &Connection, chunk: &KnowledgeChunk) -> AppResult<bool> {
    let embedding = chunk
        .embedding
        .as_ref()
        .ok_or_else(|| AppError::Knowledge("Chunk missing embedding".to_string()))?;

    let metadata_json = serde_json::to_string(&chunk.metadata)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize metadata: {}", e)))?;

    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO chunks (id, source_id, position, text, content_hash, embedding, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                chunk.id,
                chunk.source_id,
                chunk.position as i64,
                chunk.text,
                chunk.content_hash,
                embedding_to_bytes(embedding),
                metadata_json,
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;

    Ok(inserted > 0)
}

/// Query the index for top-k most similar chunks with their source locator.
pub fn query_chunks(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(KnowledgeChunk, String, f32)>> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.source_id, c.position, c.text, c.content_hash, c.embedding, c.metadata, s.locator
             FROM chunks c JOIN sources s ON s.id = c.source_id
             ORDER BY c.rowid",
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(5)?;
            let metadata_json: Option<String> = row.get(6)?;
            Ok((
                KnowledgeChunk {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    position: row.get::<_, i64>(2)? as u32,
                    text: row.get(3)?,
                    content_hash: row.get(4)?,
                    embedding: None,
                    metadata: serde_json::Value::Null,
                },
                embedding_bytes,
                metadata_json,
                row.get::<_, String>(7)?,
            ))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

    let mut scored = Vec::new();
    for row in rows {
        let (mut chunk, embedding_bytes, metadata_json, locator) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk row: {}", e)))?;

        let embedding = bytes_to_embedding(&embedding_bytes)?;
        let score = cosine_similarity(query_embedding, &embedding);
        chunk.embedding = Some(embedding);
        chunk.metadata = match metadata_json {
            Some(json) => serde_json::from_str(&json)?,
            None => serde_json::Value::Null,
        };

        scored.push(((chunk, locator), score));
    }

    let results: Vec<_> = rank_top_k(scored, top_k)
        .into_iter()
        .map(|((chunk, locator), score)| (chunk, locator, score))
        .collect();

    tracing::debug!(
        "Retrieved {} chunks (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

/// Get statistics for the index.
pub fn get_stats(conn: &Connection) -> AppResult<(u32, u32)> {
    let sources_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM sources", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count sources: {}", e)))?;

    let chunks_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM chunks", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))?;

    Ok((sources_count, chunks_count))
}

/// Timestamp of the most recently learned source.
pub fn last_learned_at(conn: &Connection) -> AppResult<Option<DateTime<Utc>>> {
    let latest: Option<String> = conn
        .query_row("SELECT MAX(learned_at) FROM sources", [], |row| row.get(0))
        .optional()
        .map_err(|e| AppError::Knowledge(format!("Failed to read learn time: {}", e)))?
        .flatten();

    Ok(latest
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

/// Reset the index (delete all data).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM chunks", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete chunks: {}", e)))?;

    conn.execute("DELETE FROM sources", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete sources: {}", e)))?;

    tracing::info!("Reset knowledge base index");
    Ok(())
}

/// A knowledge base opened for similarity search.
pub struct SqliteDocumentIndex {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
    path: PathBuf,
}

impl SqliteDocumentIndex {
    /// Open an existing index file.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::Knowledge(format!(
                "No document index at {:?}. Run 'troubleshooter knowledge learn' first.",
                db_path
            )));
        }

        Ok(Self {
            conn: Mutex::new(init_index(db_path)?),
            embedder,
            path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentIndex for SqliteDocumentIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>> {
        let query_embedding = self.embedder.embed(query).await?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Knowledge("Document index lock poisoned".to_string()))?;

        let results = query_chunks(&conn, &query_embedding, k)?;

        Ok(results
            .into_iter()
            .map(|(chunk, locator, score)| RetrievedPassage {
                text: chunk.text,
                locator,
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::content_hash;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn source(id: &str, locator: &str) -> KnowledgeSource {
        KnowledgeSource {
            id: id.to_string(),
            locator: locator.to_string(),
            content_type: "html".to_string(),
            learned_at: Utc::now(),
            size_bytes: 100,
        }
    }

    fn chunk(id: &str, source_id: &str, text: &str, embedding: Vec<f32>) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.to_string(),
            source_id: source_id.to_string(),
            position: 0,
            text: text.to_string(),
            content_hash: content_hash(text),
            embedding: Some(embedding),
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_init_index() {
        let temp = TempDir::new().unwrap();
        let conn = init_index(&temp.path().join("kb/index.sqlite")).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!(table_count >= 2);
    }

    #[test]
    fn test_insert_and_query_returns_locator() {
        let temp = TempDir::new().unwrap();
        let conn = init_index(&temp.path().join("index.sqlite")).unwrap();

        insert_source(&conn, &source("s1", "https://example.com/mex")).unwrap();
        assert!(insert_chunk(&conn, &chunk("c1", "s1", "mex crash", vec![1.0, 0.0, 0.0])).unwrap());
        assert!(insert_chunk(&conn, &chunk("c2", "s1", "license", vec![0.0, 1.0, 0.0])).unwrap());

        let results = query_chunks(&conn, &[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "c1");
        assert_eq!(results[0].1, "https://example.com/mex");
        assert!(results[0].2 > results[1].2);
    }

    #[test]
    fn test_duplicate_chunk_text_ignored() {
        let temp = TempDir::new().unwrap();
        let conn = init_index(&temp.path().join("index.sqlite")).unwrap();

        insert_source(&conn, &source("s1", "a.html")).unwrap();
        assert!(insert_chunk(&conn, &chunk("c1", "s1", "same text", vec![1.0])).unwrap());
        assert!(!insert_chunk(&conn, &chunk("c2", "s1", "same text", vec![1.0])).unwrap());

        assert_eq!(get_stats(&conn).unwrap(), (1, 1));
    }

    #[test]
    fn test_reset_and_last_learned() {
        let temp = TempDir::new().unwrap();
        let conn = init_index(&temp.path().join("index.sqlite")).unwrap();
        assert!(last_learned_at(&conn).unwrap().is_none());

        insert_source(&conn, &source("s1", "a.html")).unwrap();
        assert!(last_learned_at(&conn).unwrap().is_some());

        reset_index(&conn).unwrap();
        assert_eq!(get_stats(&conn).unwrap(), (0, 0));
    }

    #[test]
    fn test_open_missing_index_fails() {
        let temp = TempDir::new().unwrap();
        let embedder = Arc::new(TrigramProvider::new(64));
        assert!(SqliteDocumentIndex::open(&temp.path().join("none.sqlite"), embedder).is_err());
    }

    #[tokio::test]
    async fn test_similarity_search_through_trait() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        let embedder = Arc::new(TrigramProvider::new(128));

        {
            let conn = init_index(&path).unwrap();
            insert_source(&conn, &source("s1", "https://example.com/loops")).unwrap();
            for (id, text) in [
                ("c1", "Algebraic loop detected in Simulink model"),
                ("c2", "License manager error -8 when starting MATLAB"),
            ] {
                let embedding = embedder.embed(text).await.unwrap();
                insert_chunk(&conn, &chunk(id, "s1", text, embedding)).unwrap();
            }
        }

        let index = SqliteDocumentIndex::open(&path, embedder).unwrap();
        let passages = index
            .similarity_search("simulink algebraic loop", 1)
            .await
            .unwrap();

        assert_eq!(passages.len(), 1);
        assert!(passages[0].text.contains("Algebraic loop"));
        assert_eq!(passages[0].locator, "https://example.com/loops");
    }
}
