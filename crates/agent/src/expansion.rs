//! Parsing of query-expansion output.

use troubleshooter_core::{AppError, AppResult};

/// Parse the model's list of search-query variants.
///
/// The output must contain a JSON array of exactly `expected` non-empty
/// strings. Surrounding prose or code fences are tolerated; a short, long
/// or non-string list is an error, never a partial result.
pub fn parse_query_variants(raw: &str, expected: usize) -> AppResult<Vec<String>> {
    let start = raw.find('[');
    let end = raw.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            return Err(AppError::Workflow(format!(
                "Query expansion did not return a list: {:?}",
                truncate(raw)
            )))
        }
    };

    let items: Vec<String> = serde_json::from_str(json).map_err(|e| {
        AppError::Workflow(format!("Query expansion returned an unparseable list: {}", e))
    })?;

    let variants: Vec<String> = items.into_iter().map(|s| s.trim().to_string()).collect();
    if variants.iter().any(|v| v.is_empty()) {
        return Err(AppError::Workflow(
            "Query expansion returned an empty variant".to_string(),
        ));
    }
    if variants.len() != expected {
        return Err(AppError::Workflow(format!(
            "Query expansion returned {} variants, expected {}",
            variants.len(),
            expected
        )));
    }

    Ok(variants)
}

fn truncate(raw: &str) -> String {
    raw.chars().take(80).collect()
}
