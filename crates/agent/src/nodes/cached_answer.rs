use troubleshooter_knowledge::{AnswerStore, CandidateMatch, StoredAnswer};

use crate::answer::{dedup_links, Answer, Route};
use crate::call::retry_read;
use crate::runner::{vars, ModelRunner};

/// Compose an answer from stored answers to similar questions.
///
/// Matches whose answer cannot be resolved are dropped. With nothing left
/// the model still runs over an empty context.
pub async fn answer_from_cache(
    runner: &ModelRunner,
    answers: &dyn AnswerStore,
    query: &str,
    matches: &[CandidateMatch],
) -> Answer {
    let resolved = resolve(runner, answers, matches).await;
    tracing::info!("Resolved {}/{} cached answers", resolved.len(), matches.len());

    let qa_pairs = resolved
        .iter()
        .map(|(question, stored)| format!("Q: {}\nA: {}", question, stored.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    let links = dedup_links(resolved.into_iter().flat_map(|(_, stored)| stored.links));

    match runner
        .generate(
            "answer.cached",
            vars([("query", query.to_string()), ("qaPairs", qa_pairs)]),
        )
        .await
    {
        Ok(raw) => Answer::new(extract_final_answer(&raw), links, Route::Cache),
        Err(e) => {
            tracing::error!("Cached answer composition failed: {}", e);
            Answer::failed(Route::Cache, e)
        }
    }
}

async fn resolve(
    runner: &ModelRunner,
    answers: &dyn AnswerStore,
    matches: &[CandidateMatch],
) -> Vec<(String, StoredAnswer)> {
    let mut resolved = Vec::with_capacity(matches.len());
    for candidate in matches {
        let result = retry_read("answer store read", runner.timeout(), runner.read_retries(), || {
            answers.get(&candidate.answer_id)
        })
        .await;

        match result {
            Ok(Some(stored)) => resolved.push((candidate.question.clone(), stored)),
            Ok(None) => tracing::warn!(
                "Cached question {:?} points at missing answer {}",
                candidate.question,
                candidate.answer_id
            ),
            Err(e) => tracing::warn!("Dropping cached answer {}: {}", candidate.answer_id, e),
        }
    }
    resolved
}

/// Strip echoed Q/A pairs from a cached-answer completion.
///
/// When the model repeats the `A:` markers it was given, the text after the
/// last one is the answer. Only an `A:` opening a line counts as a marker.
pub fn extract_final_answer(raw: &str) -> String {
    let mut answer = raw;
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        let body = line.trim_start();
        if let Some(rest) = body.strip_prefix("A:") {
            let start = offset + (line.len() - rest.len());
            answer = &raw[start..];
        }
        offset += line.len();
    }
    answer.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain() {
        assert_eq!(extract_final_answer("  Use GDB.  "), "Use GDB.");
    }

    #[test]
    fn test_extract_ignores_marker_inside_words() {
        let raw = "Install the matching CUDA: driver 12.2 and restart MATLAB.";
        assert_eq!(extract_final_answer(raw), raw);

        let echoed = "Q: GPU not found\nA: Install the matching CUDA: driver 12.2.\nDATA: logs are in tempdir.";
        assert_eq!(
            extract_final_answer(echoed),
            "Install the matching CUDA: driver 12.2.\nDATA: logs are in tempdir."
        );
    }

    #[test]
    fn test_extract_indented_marker() {
        assert_eq!(extract_final_answer("Q: x\n   A: Use GDB."), "Use GDB.");
    }

    #[test]
    fn test_extract_after_last_marker() {
        let raw = "Q: one\nA: first\n\nQ: two\nA: Use crash dump logs and GDB.";
        assert_eq!(extract_final_answer(raw), "Use crash dump logs and GDB.");
    }
}
