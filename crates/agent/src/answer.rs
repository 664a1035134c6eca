//! The workflow's output type.

use serde::{Deserialize, Serialize};

/// Text shown when an answer could not be produced.
pub const ERROR_TEXT: &str =
    "Sorry, I couldn't answer that right now. Please try again in a moment.";

/// Which branch of the workflow produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Off-domain query answered conversationally
    General,
    /// Composed from previously stored answers
    Cache,
    /// Composed from retrieved document passages
    Retrieval,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Cache => "cache",
            Self::Retrieval => "retrieval",
        }
    }
}

/// Response text plus the locators of the content it was built from.
///
/// Failures never escape the workflow as errors: they come back as an
/// answer whose `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    pub links: Vec<String>,
    pub route: Route,
    pub error: Option<String>,
}

impl Answer {
    pub fn new(text: impl Into<String>, links: Vec<String>, route: Route) -> Self {
        Self {
            text: text.into(),
            links,
            route,
            error: None,
        }
    }

    /// An error-marked answer.
    pub fn failed(route: Route, error: impl std::fmt::Display) -> Self {
        Self {
            text: ERROR_TEXT.to_string(),
            links: Vec::new(),
            route,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Drop empty and repeated links, keeping first-seen order.
pub fn dedup_links<I>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    links
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}
