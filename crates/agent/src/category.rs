//! Troubleshooting categories and their knowledge-base keys.

use serde::Serialize;
use troubleshooter_core::AppResult;

use crate::runner::{vars, ModelRunner};

/// The five troubleshooting areas queries are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    SystemConfiguration,
    ModelPreparation,
    ControlAndInstrumentation,
    PerformanceOptimization,
    SimulinkRealTime,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SystemConfiguration,
        Category::ModelPreparation,
        Category::ControlAndInstrumentation,
        Category::PerformanceOptimization,
        Category::SimulinkRealTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SystemConfiguration => "Troubleshooting System Configuration",
            Self::ModelPreparation => "Troubleshooting Model Preparation",
            Self::ControlAndInstrumentation => "Troubleshooting Control and Instrumentation",
            Self::PerformanceOptimization => "Troubleshooting Performance Optimization",
            Self::SimulinkRealTime => "More Troubleshooting: Simulink Real-Time Support",
        }
    }

    /// Knowledge base name holding this category's documents.
    pub fn knowledge_key(&self) -> String {
        knowledge_key(self.label())
    }

    /// Match a model reply against the category labels.
    ///
    /// Accepts the exact label anywhere in the reply, ignoring case, and
    /// falls back to the distinguishing keywords of each label.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        if let Some(category) = Self::ALL
            .iter()
            .find(|c| lower.contains(&c.label().to_lowercase()))
        {
            return Some(*category);
        }

        Self::ALL
            .iter()
            .find(|c| c.keywords().iter().any(|k| lower.contains(k)))
            .copied()
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::SystemConfiguration => &["system configuration"],
            Self::ModelPreparation => &["model preparation"],
            Self::ControlAndInstrumentation => &["control and instrumentation", "instrumentation"],
            Self::PerformanceOptimization => &["performance optimization", "performance"],
            Self::SimulinkRealTime => &["real-time support", "simulink real-time", "real-time"],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize a category label into a knowledge base name.
pub fn knowledge_key(label: &str) -> String {
    label
        .to_lowercase()
        .replace([':', '-'], "")
        .replace(' ', "_")
}

/// Ask the model which category a query belongs to.
///
/// `Ok(None)` when the reply names none of the categories.
pub async fn categorize(runner: &ModelRunner, query: &str) -> AppResult<Option<Category>> {
    let listing = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.label()))
        .collect::<Vec<_>>()
        .join("\n");

    let raw = runner
        .generate(
            "query.category",
            vars([("query", query.to_string()), ("categories", listing)]),
        )
        .await?;

    let category = Category::parse(&raw);
    tracing::info!("Categorized query as {:?} (raw: {:?})", category, raw);
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_keys() {
        assert_eq!(
            Category::SystemConfiguration.knowledge_key(),
            "troubleshooting_system_configuration"
        );
        assert_eq!(
            Category::SimulinkRealTime.knowledge_key(),
            "more_troubleshooting_simulink_realtime_support"
        );
    }

    #[test]
    fn test_parse_exact_and_noisy() {
        assert_eq!(
            Category::parse("Troubleshooting Model Preparation"),
            Some(Category::ModelPreparation)
        );
        assert_eq!(
            Category::parse("  troubleshooting performance optimization.\n"),
            Some(Category::PerformanceOptimization)
        );
        assert_eq!(
            Category::parse("Category: More Troubleshooting: Simulink Real-Time Support"),
            Some(Category::SimulinkRealTime)
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            Category::parse("Control and Instrumentation"),
            Some(Category::ControlAndInstrumentation)
        );
        assert_eq!(Category::parse("real-time"), Some(Category::SimulinkRealTime));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::parse("Licensing"), None);
    }
}
