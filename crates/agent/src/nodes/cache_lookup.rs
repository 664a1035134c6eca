use troubleshooter_core::AppResult;
use troubleshooter_knowledge::{CandidateMatch, QuestionIndex};

use crate::call::retry_read;
use crate::runner::{vars, ModelRunner};

/// Look for previously answered questions close enough to reuse.
///
/// Returns `None` (no match) when the index is empty, when nothing is
/// found, when the match classifier says no, or on any error.
pub async fn find_cached_question(
    runner: &ModelRunner,
    questions: &dyn QuestionIndex,
    query: &str,
    k: usize,
) -> Option<Vec<CandidateMatch>> {
    match lookup(runner, questions, query, k).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Cache lookup failed, falling back to retrieval: {}", e);
            None
        }
    }
}

async fn lookup(
    runner: &ModelRunner,
    questions: &dyn QuestionIndex,
    query: &str,
    k: usize,
) -> AppResult<Option<Vec<CandidateMatch>>> {
    let empty = retry_read(
        "question index count",
        runner.timeout(),
        runner.read_retries(),
        || questions.is_empty(),
    )
    .await?;
    if empty {
        tracing::debug!("Question index is empty");
        return Ok(None);
    }

    let matches = retry_read(
        "question index search",
        runner.timeout(),
        runner.read_retries(),
        || questions.similarity_search(query, k),
    )
    .await?;
    if matches.is_empty() {
        return Ok(None);
    }

    let listing = matches
        .iter()
        .map(|m| format!("- {}", m.question))
        .collect::<Vec<_>>()
        .join("\n");

    let judgment = runner
        .classify(
            "cache.match",
            vars([("query", query.to_string()), ("questions", listing)]),
        )
        .await?;

    tracing::info!(
        "Cache lookup: {} candidate(s), usable = {}",
        matches.len(),
        judgment.is_yes()
    );
    Ok(judgment.is_yes().then_some(matches))
}
