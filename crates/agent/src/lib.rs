//! Answer workflow for the troubleshooting assistant.
//!
//! A query is first checked for relevance. Off-domain queries get a short
//! conversational reply. Relevant ones are looked up in the question cache;
//! a usable hit is answered from stored answers, a miss goes through query
//! expansion, multi-query retrieval with reciprocal-rank fusion and
//! grounded composition, after which the new answer is cached.

pub mod answer;
pub mod call;
pub mod category;
pub mod expansion;
pub mod fusion;
pub mod judgment;
pub mod nodes;
pub mod runner;
pub mod state;
pub mod suggest;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use answer::{Answer, Route};
pub use category::{categorize, knowledge_key, Category};
pub use fusion::{reciprocal_rank_fusion, FusedPassage};
pub use judgment::Judgment;
pub use nodes::store_pair;
pub use runner::ModelRunner;
pub use state::{State, MAX_TRANSITIONS};
pub use suggest::suggest;
pub use workflow::{Workflow, WorkflowRun};
