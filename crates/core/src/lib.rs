//! Troubleshooter Core Library
//!
//! This crate provides the foundational utilities for the troubleshooting assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (application, provider and workflow settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EmbeddingSettings, WorkflowSettings};
pub use error::{AppError, AppResult};
