//! Storage interfaces consumed by the answer workflow.
//!
//! All three are shared, append-only state: any number of workflow
//! invocations may read or append concurrently.

use crate::types::{CandidateMatch, RetrievedPassage, StoredAnswer};
use async_trait::async_trait;
use troubleshooter_core::AppResult;

/// Similarity search over ingested document chunks.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Top-`k` passages for `query`, most similar first.
    async fn similarity_search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>>;
}

/// Index of previously answered questions.
#[async_trait]
pub trait QuestionIndex: Send + Sync {
    /// Top-`k` cached questions for `query`, most similar first.
    async fn similarity_search(&self, query: &str, k: usize) -> AppResult<Vec<CandidateMatch>>;

    /// Append a question pointing at a stored answer.
    async fn add(&self, question: &str, answer_id: &str) -> AppResult<()>;

    /// Number of cached questions.
    async fn len(&self) -> AppResult<usize>;

    async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Answers keyed by generated identifier.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Fetch an answer; `None` when the id is unknown.
    async fn get(&self, id: &str) -> AppResult<Option<StoredAnswer>>;

    /// Store an answer and return its new identifier.
    async fn put(&self, question: &str, answer: &str, links: &[String]) -> AppResult<String>;

    /// Number of stored answers.
    async fn len(&self) -> AppResult<usize>;
}
