//! Source parsing and text extraction.

use std::fs;
use std::path::Path;
use troubleshooter_core::{AppError, AppResult};

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("txt") | Some("log") | Some("m") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Detect content type from an HTTP `Content-Type` header value.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("html") {
            Self::Html
        } else if mime.contains("markdown") {
            Self::Markdown
        } else if mime.starts_with("text/") {
            Self::PlainText
        } else {
            Self::Unknown
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    extract_text(&raw, ContentType::from_path(path))
        .map_err(|e| AppError::Knowledge(format!("{:?}: {}", path, e)))
}

/// Extract clean text from raw content of a known type.
pub fn extract_text(raw: &str, content_type: ContentType) -> AppResult<String> {
    match content_type {
        ContentType::Markdown => Ok(clean_markdown(raw)),
        ContentType::Html => Ok(clean_html(raw)),
        ContentType::PlainText => Ok(raw.trim().to_string()),
        ContentType::Unknown => {
            if looks_like_html(raw) {
                Ok(clean_html(raw))
            } else if is_likely_text(raw) {
                Ok(raw.trim().to_string())
            } else {
                Err(AppError::Knowledge("Binary content not supported".to_string()))
            }
        }
    }
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Fences and rules carry no text
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Strip tags, scripts and styles from HTML and collapse whitespace.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            if in_tag {
                in_tag = false;
                // Tags separate words
                result.push(' ');
            }
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    decode_entities(&result)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .as_bytes()
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
        .unwrap_or(false)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text.chars().take(512).collect::<String>().to_ascii_lowercase();
    head.contains("<html") || head.contains("<!doctype html")
}

/// Check if text is likely UTF-8 text (not binary).
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}
