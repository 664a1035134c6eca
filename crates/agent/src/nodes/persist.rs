use std::time::Duration;

use troubleshooter_core::{AppError, AppResult};
use troubleshooter_knowledge::{AnswerStore, QuestionIndex};

use crate::answer::Answer;
use crate::call::with_timeout;

/// Write a question/answer pair to the answer store, then index the
/// question. Returns the new answer id.
///
/// Neither write is retried. If indexing fails the stored answer stays
/// behind unreferenced; the error names its id.
pub async fn store_pair(
    questions: &dyn QuestionIndex,
    answers: &dyn AnswerStore,
    question: &str,
    answer: &str,
    links: &[String],
) -> AppResult<String> {
    let answer_id = answers.put(question, answer, links).await?;

    questions.add(question, &answer_id).await.map_err(|e| {
        AppError::Store(format!(
            "Answer {} stored but question not indexed: {}",
            answer_id, e
        ))
    })?;

    Ok(answer_id)
}

/// Persist a freshly generated answer so repeat questions hit the cache.
///
/// Failures are logged and the answer is returned unchanged.
pub async fn persist(
    questions: &dyn QuestionIndex,
    answers: &dyn AnswerStore,
    query: &str,
    answer: Answer,
    budget: Duration,
) -> Answer {
    let write = store_pair(questions, answers, query, &answer.text, &answer.links);
    match with_timeout("cache write", budget, write).await {
        Ok(id) => tracing::info!("Cached answer {}", id),
        Err(e) => tracing::warn!("Failed to cache answer: {}", e),
    }
    answer
}
