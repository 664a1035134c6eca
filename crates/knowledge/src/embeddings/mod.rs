//! Embedding providers for the document and question indexes.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
