use crate::judgment::Judgment;
use crate::runner::{vars, ModelRunner};

/// Decide whether `query` is in the troubleshooting domain.
///
/// Fails closed: any error is treated as not relevant.
pub async fn classify_relevance(runner: &ModelRunner, query: &str) -> Judgment {
    match runner
        .classify("relevance.classify", vars([("query", query.to_string())]))
        .await
    {
        Ok(judgment) => judgment,
        Err(e) => {
            tracing::warn!("Relevance classification failed, treating as not relevant: {}", e);
            Judgment::No
        }
    }
}
