//! Error types for the troubleshooting assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, LLM, knowledge, store,
//! prompt and workflow errors.

use thiserror::Error;

/// Unified error type for the troubleshooting assistant.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document index and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Question index and answer store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Answer workflow errors (malformed model output, missing context)
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// An external call exceeded its time budget
    #[error("Timed out after {secs}s: {operation}")]
    Timeout { operation: String, secs: u64 },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
