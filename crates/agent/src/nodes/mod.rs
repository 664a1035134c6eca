//! Workflow nodes.
//!
//! Each node converts its own failures into the documented default before
//! returning, so none of them surfaces an error to the workflow loop.

pub mod cache_lookup;
pub mod cached_answer;
pub mod general;
pub mod persist;
pub mod rag_answer;
pub mod relevance;

pub use cache_lookup::find_cached_question;
pub use cached_answer::{answer_from_cache, extract_final_answer};
pub use general::initial_answer;
pub use persist::{persist, store_pair};
pub use rag_answer::{answer_from_retrieval, RetrievalOptions};
pub use relevance::classify_relevance;
