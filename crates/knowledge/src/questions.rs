//! SQLite-backed index of previously answered questions.

use crate::embeddings::EmbeddingProvider;
use crate::store::QuestionIndex;
use crate::types::CandidateMatch;
use crate::vector::{bytes_to_embedding, cosine_similarity, embedding_to_bytes, rank_top_k};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use troubleshooter_core::{AppError, AppResult};

/// Append-only question index. Rows are inserted, never updated or deleted.
pub struct SqliteQuestionIndex {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteQuestionIndex {
    /// Open (creating if needed) the question index at `db_path`.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Store(format!("Failed to create cache directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Store(format!("Failed to open question index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer_id TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create questions table: {}", e)))?;

        tracing::debug!("Opened question index at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Question index lock poisoned".to_string()))
    }
}

#[async_trait]
impl QuestionIndex for SqliteQuestionIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> AppResult<Vec<CandidateMatch>> {
        let query_embedding = self.embedder.embed(query).await?;

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT question, answer_id, embedding FROM questions ORDER BY id")
            .map_err(|e| AppError::Store(format!("Failed to prepare question query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| AppError::Store(format!("Failed to query questions: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (question, answer_id, bytes) =
                row.map_err(|e| AppError::Store(format!("Failed to read question row: {}", e)))?;
            let score = cosine_similarity(&query_embedding, &bytes_to_embedding(&bytes)?);
            scored.push(((question, answer_id), score));
        }

        Ok(rank_top_k(scored, k)
            .into_iter()
            .map(|((question, answer_id), score)| CandidateMatch {
                question,
                answer_id,
                score,
            })
            .collect())
    }

    async fn add(&self, question: &str, answer_id: &str) -> AppResult<()> {
        let embedding = self.embedder.embed(question).await?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO questions (question, answer_id, embedding, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                question,
                answer_id,
                embedding_to_bytes(&embedding),
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| AppError::Store(format!("Failed to add question: {}", e)))?;

        tracing::debug!("Cached question for answer {}", answer_id);
        Ok(())
    }

    async fn len(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM questions", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| AppError::Store(format!("Failed to count questions: {}", e)))
    }
}
