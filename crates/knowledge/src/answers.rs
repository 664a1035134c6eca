//! SQLite-backed answer store keyed by generated UUID.

use crate::store::AnswerStore;
use crate::types::StoredAnswer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use troubleshooter_core::{AppError, AppResult};

pub struct SqliteAnswerStore {
    conn: Mutex<Connection>,
}

impl SqliteAnswerStore {
    /// Open (creating if needed) the answer store at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Store(format!("Failed to create cache directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Store(format!("Failed to open answer store: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS answers (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                links TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create answers table: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Answer store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AnswerStore for SqliteAnswerStore {
    async fn get(&self, id: &str) -> AppResult<Option<StoredAnswer>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, question, answer, links, created_at FROM answers WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AppError::Store(format!("Failed to read answer {}: {}", id, e)))?;

        let Some((id, question, answer, links_json, created_at)) = row else {
            return Ok(None);
        };

        let links: Vec<String> = serde_json::from_str(&links_json)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| AppError::Store(format!("Corrupt timestamp on answer {}: {}", id, e)))?
            .with_timezone(&Utc);

        Ok(Some(StoredAnswer {
            id,
            question,
            answer,
            links,
            created_at,
        }))
    }

    async fn put(&self, question: &str, answer: &str, links: &[String]) -> AppResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let links_json = serde_json::to_string(links)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO answers (id, question, answer, links, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, question, answer, links_json, Utc::now().to_rfc3339()],
        )
        .map_err(|e| AppError::Store(format!("Failed to store answer: {}", e)))?;

        tracing::debug!("Stored answer {} ({} links)", id, links.len());
        Ok(id)
    }

    async fn len(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM answers", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| AppError::Store(format!("Failed to count answers: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get() {
        let temp = TempDir::new().unwrap();
        let store = SqliteAnswerStore::open(&temp.path().join("answers.sqlite")).unwrap();

        let links = vec!["https://example.com/gdb".to_string()];
        let id = store
            .put("How to debug segmentation faults?", "Use crash dump logs and GDB.", &links)
            .await
            .unwrap();

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.answer, "Use crash dump logs and GDB.");
        assert_eq!(stored.links, links);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let temp = TempDir::new().unwrap();
        let store = SqliteAnswerStore::open(&temp.path().join("answers.sqlite")).unwrap();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let temp = TempDir::new().unwrap();
        let store = SqliteAnswerStore::open(&temp.path().join("answers.sqlite")).unwrap();

        let a = store.put("q", "a", &[]).await.unwrap();
        let b = store.put("q", "a", &[]).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
