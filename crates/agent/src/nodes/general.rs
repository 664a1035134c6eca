use crate::answer::{Answer, Route};
use crate::runner::{vars, ModelRunner};

/// Conversational reply for queries outside the troubleshooting domain.
pub async fn initial_answer(runner: &ModelRunner, query: &str) -> Answer {
    match runner
        .generate("answer.general", vars([("query", query.to_string())]))
        .await
    {
        Ok(text) => Answer::new(text, Vec::new(), Route::General),
        Err(e) => {
            tracing::error!("General response failed: {}", e);
            Answer::failed(Route::General, e)
        }
    }
}
