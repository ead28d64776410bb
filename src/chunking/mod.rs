//! Note chunking: splits a document body into overlapping chunks bounded
//! by an approximate size, along markdown section boundaries.
//!
//! The split points are runs of two-or-more newlines, or the start of a
//! line beginning with `##`/`###`. Sections are accumulated into a chunk
//! until adding the next section would exceed `chunk_size * 4` characters
//! (an approximate tokens-to-characters conversion), at which point the
//! chunk is emitted and the next one is seeded with the trailing
//! `chunk_overlap * 4` characters of the one just emitted.

use crate::core::{Chunk, Document};
use regex::Regex;
use std::sync::LazyLock;

/// A document body shorter than this (in non-whitespace characters)
/// produces zero chunks.
pub const MIN_BODY_LEN: usize = 50;

#[allow(clippy::expect_used)]
static SECTION_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\n\n+|(?=^#{2,3}\s)").expect("valid regex")
});

/// Splits `body` into chunks for `document`, using `chunk_size` and
/// `chunk_overlap` (both in approximate tokens).
///
/// Returns an empty vector if the body has fewer than [`MIN_BODY_LEN`]
/// non-whitespace characters.
#[must_use]
pub fn chunk_document(
    document: &Document,
    body: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    if body.chars().filter(|c| !c.is_whitespace()).count() < MIN_BODY_LEN {
        return Vec::new();
    }

    let max_chars = chunk_size.saturating_mul(4).max(1);
    let overlap_chars = chunk_overlap.saturating_mul(4);

    let sections: Vec<&str> = SECTION_SPLIT
        .split(body)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut chunks_text: Vec<String> = Vec::new();
    let mut current = String::new();

    for section in sections {
        let candidate_len = if current.is_empty() {
            section.len()
        } else {
            current.len() + 2 + section.len()
        };

        if !current.is_empty() && candidate_len > max_chars {
            let overlap_seed = trailing_chars(&current, overlap_chars);
            chunks_text.push(std::mem::take(&mut current));
            current = overlap_seed;
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(section);
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(section);
        }
    }

    if !current.trim().is_empty() {
        chunks_text.push(current);
    }

    chunks_text
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::new(document, index, content))
        .collect()
}

/// Returns the trailing `n` characters of `s`, respecting UTF-8 boundaries.
fn trailing_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= n {
        return s.to_string();
    }
    s.chars().skip(char_count - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Vault;

    fn doc() -> Document {
        Document {
            file_path: "/vault/work/notes/a.md".into(),
            file_hash: "h".into(),
            vault: Vault::Work,
            title: "A".into(),
            category: "notes".into(),
            people: vec![],
            projects: vec![],
            date: None,
        }
    }

    #[test]
    fn short_body_produces_no_chunks() {
        let chunks = chunk_document(&doc(), "too short", 500, 50);
        assert!(chunks.is_empty());
    }

    #[test]
    fn body_above_threshold_produces_one_chunk_when_under_size() {
        let body = "x".repeat(60);
        let chunks = chunk_document(&doc(), &body, 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].id, "h_0");
    }

    #[test]
    fn splits_on_blank_line_runs_when_oversized() {
        let section = "word ".repeat(80); // ~400 chars per section
        let body = format!("{section}\n\n{section}\n\n{section}\n\n{section}");
        // chunk_size=50 tokens -> 200 char budget, forces a split across sections
        let chunks = chunk_document(&doc(), &body, 50, 10);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
        }
    }

    #[test]
    fn splits_before_heading_lines() {
        let body = format!(
            "{}\n## Section Two\n{}",
            "intro text ".repeat(60),
            "more text ".repeat(60)
        );
        let chunks = chunk_document(&doc(), &body, 20, 5);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn overlap_seeds_the_next_chunk() {
        let section = "alpha ".repeat(60);
        let body = format!("{section}\n\n{section}\n\n{section}");
        let chunks = chunk_document(&doc(), &body, 20, 10);
        assert!(chunks.len() > 1);
        // the overlap seed (trailing chars of chunk N) should prefix chunk N+1
        let overlap_chars = 10 * 4;
        let tail_of_first = trailing_chars(&chunks[0].content, overlap_chars);
        assert!(chunks[1].content.starts_with(&tail_of_first));
    }

    #[test]
    fn ids_are_dense_and_prefixed_by_file_hash() {
        let section = "beta ".repeat(100);
        let body = format!("{section}\n\n{section}\n\n{section}");
        let chunks = chunk_document(&doc(), &body, 20, 5);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.id, format!("h_{i}"));
        }
    }
}
