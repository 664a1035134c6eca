//! Autocomplete suggestions for partially typed queries.

use std::collections::HashSet;

use troubleshooter_core::AppResult;

use crate::runner::{vars, ModelRunner};

/// Number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// Suggest completions of `partial`. Empty input returns no suggestions
/// without calling the model.
pub async fn suggest(runner: &ModelRunner, partial: &str) -> AppResult<Vec<String>> {
    let partial = partial.trim();
    if partial.is_empty() {
        return Ok(Vec::new());
    }

    let raw = runner
        .generate(
            "query.suggest",
            vars([
                ("partial", partial.to_string()),
                ("count", MAX_SUGGESTIONS.to_string()),
            ]),
        )
        .await?;

    Ok(parse_suggestions(&raw, partial, MAX_SUGGESTIONS))
}

/// Split model output into suggestions that extend `partial`.
///
/// Entries are separated by `$` or newlines; list bullets, numbering and
/// quotes are stripped. Only entries starting with `partial` (ignoring
/// case) are kept, without duplicates.
pub fn parse_suggestions(raw: &str, partial: &str, max: usize) -> Vec<String> {
    let prefix = partial.trim().to_lowercase();
    let mut seen = HashSet::new();

    raw.split(['$', '\n'])
        .map(clean_entry)
        .filter(|s| !s.is_empty())
        .filter(|s| s.to_lowercase().starts_with(&prefix))
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(max)
        .collect()
}

fn clean_entry(entry: &str) -> String {
    let entry = entry.trim();
    let entry = entry.trim_start_matches(|c: char| {
        c.is_ascii_digit() || c == '.' || c == ')' || c == '-' || c == '*' || c == '•'
    });
    entry
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_separated() {
        let raw = "simulink model not compiling$simulink model crashes on start$simulink model slow";
        let suggestions = parse_suggestions(raw, "simulink model", 3);
        assert_eq!(
            suggestions,
            vec![
                "simulink model not compiling",
                "simulink model crashes on start",
                "simulink model slow",
            ]
        );
    }

    #[test]
    fn test_bullets_and_filtering() {
        let raw = "1. \"Undefined function error\"\n- undefined variable in script\n* Something unrelated\n2. undefined function error";
        let suggestions = parse_suggestions(raw, "Undefined", 3);
        assert_eq!(
            suggestions,
            vec!["Undefined function error", "undefined variable in script"]
        );
    }

    #[test]
    fn test_caps_at_max() {
        let raw = "a1$a2$a3$a4";
        assert_eq!(parse_suggestions(raw, "a", 3).len(), 3);
    }

    #[test]
    fn test_nothing_usable() {
        assert!(parse_suggestions("", "matlab", 3).is_empty());
        assert!(parse_suggestions("$ $\n", "matlab", 3).is_empty());
    }
}
