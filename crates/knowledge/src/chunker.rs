//! Text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;
use sha2::{Digest, Sha256};

/// Chunk text into overlapping character windows.
///
/// Sizes are in bytes, snapped to UTF-8 boundaries. A trailing window
/// shorter than a tenth of `chunk_size` is dropped unless it is the only one.
pub fn chunk_text(
    source_id: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ChunkCandidate> {
    let chunk_size = chunk_size.max(1);
    if text.trim().is_empty() {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single character wider than chunk_size
            end = text[start..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| start + i)
                .unwrap_or(text.len());
        }

        let window = &text[start..end];
        if window.len() < chunk_size / 10 && !chunks.is_empty() {
            break;
        }

        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(ChunkCandidate {
                source_id: source_id.to_string(),
                position,
                text: trimmed.to_string(),
                metadata: serde_json::json!({
                    "start": start,
                    "end": end,
                }),
            });
            position += 1;
        }

        if end == text.len() {
            break;
        }

        let mut next_start = start + step;
        while next_start < text.len() && !text.is_char_boundary(next_start) {
            next_start += 1;
        }
        start = next_start;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

/// Hex SHA-256 of chunk text.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_basic() {
        let text = "a".repeat(1000);
        let chunks = chunk_text("src", &text, 200, 50);

        assert!(chunks.len() > 2);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[1].position, 1);
        assert_eq!(chunks[1].metadata["start"], 150);
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(300);
        let chunks = chunk_text("src", &text, 100, 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("src", "Error -8", 500, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Error -8");
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("src", "", 100, 10).is_empty());
        assert!(chunk_text("src", "   \n ", 100, 10).is_empty());
    }

    #[test]
    fn test_overlap_repeats_text() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let chunks = chunk_text("src", &text, 50, 10);

        let first_tail: String = chunks[0].text.chars().skip(40).collect();
        assert!(chunks[1].text.starts_with(&first_tail));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "é".repeat(300);
        let chunks = chunk_text("src", &text, 101, 11);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        assert_eq!(content_hash("").len(), 64);
    }
}
