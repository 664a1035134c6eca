use futures::future::try_join_all;
use troubleshooter_core::{AppError, AppResult, WorkflowSettings};
use troubleshooter_knowledge::DocumentIndex;

use crate::answer::{dedup_links, Answer, Route};
use crate::call::retry_read;
use crate::expansion::parse_query_variants;
use crate::fusion::{reciprocal_rank_fusion, FusedPassage};
use crate::runner::{vars, ModelRunner};

/// Retrieval knobs taken from [`WorkflowSettings`].
#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub expansion_count: usize,
    pub include_original_query: bool,
    pub top_k: usize,
    pub rrf_k: u32,
    pub max_context_passages: usize,
}

impl From<&WorkflowSettings> for RetrievalOptions {
    fn from(settings: &WorkflowSettings) -> Self {
        Self {
            expansion_count: settings.expansion_count,
            include_original_query: settings.include_original_query,
            top_k: settings.retrieval_top_k,
            rrf_k: settings.rrf_k,
            max_context_passages: settings.max_context_passages,
        }
    }
}

/// Answer from the document index: expand the query, search every
/// variant, fuse the rankings and compose over the top passages.
///
/// Any failure along the way yields a single error answer.
pub async fn answer_from_retrieval(
    runner: &ModelRunner,
    documents: &dyn DocumentIndex,
    query: &str,
    options: RetrievalOptions,
) -> Answer {
    match compose(runner, documents, query, options).await {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!("Retrieval answer failed: {}", e);
            Answer::failed(Route::Retrieval, e)
        }
    }
}

async fn compose(
    runner: &ModelRunner,
    documents: &dyn DocumentIndex,
    query: &str,
    options: RetrievalOptions,
) -> AppResult<Answer> {
    let raw = runner
        .generate(
            "query.expand",
            vars([
                ("query", query.to_string()),
                ("count", options.expansion_count.to_string()),
            ]),
        )
        .await?;
    let mut variants = parse_query_variants(&raw, options.expansion_count)?;
    if options.include_original_query {
        variants.insert(0, query.to_string());
    }
    tracing::info!("Searching {} query variants", variants.len());

    let lists = try_join_all(variants.iter().map(|variant| {
        retry_read("document search", runner.timeout(), runner.read_retries(), move || {
            documents.similarity_search(variant, options.top_k)
        })
    }))
    .await?;

    let fused = reciprocal_rank_fusion(&lists, options.rrf_k);
    let top: Vec<FusedPassage> = fused.into_iter().take(options.max_context_passages).collect();
    if top.is_empty() {
        return Err(AppError::Knowledge(
            "No passages retrieved for any query variant".to_string(),
        ));
    }
    tracing::debug!(
        "Fused {} passages, top score {:.5}",
        top.len(),
        top[0].score
    );

    let context = format_context(&top);
    let links = dedup_links(top.into_iter().map(|p| p.locator));

    let text = runner
        .generate(
            "answer.rag",
            vars([("query", query.to_string()), ("context", context)]),
        )
        .await?;

    Ok(Answer::new(text, links, Route::Retrieval))
}

fn format_context(passages: &[FusedPassage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}\nSource: {}", i + 1, p.text.trim(), p.locator))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_numbering() {
        let passages = vec![
            FusedPassage {
                text: "Run gdb on the crash dump.\n".to_string(),
                locator: "https://docs.example/gdb".to_string(),
                score: 0.03,
                best_rank: 0,
            },
            FusedPassage {
                text: "Check MEX files.".to_string(),
                locator: "https://docs.example/mex".to_string(),
                score: 0.01,
                best_rank: 1,
            },
        ];

        let context = format_context(&passages);
        assert!(context.starts_with("[1] Run gdb on the crash dump.\nSource: https://docs.example/gdb"));
        assert!(context.contains("[2] Check MEX files."));
    }
}
