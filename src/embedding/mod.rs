//! Embedding generation for semantic search.
//!
//! [`Embedder`] is the seam between the indexer/searcher and whatever
//! backend produces vectors. The production implementation
//! ([`OllamaEmbedder`]) calls an external HTTP service; [`HashEmbedder`]
//! is a deterministic test double used where a live backend is
//! unavailable.

pub mod hash;
pub mod ollama;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Default embedding dimension, matching common local embedding models
/// (e.g. `nomic-embed-text`).
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Embedding text longer than this is truncated before being sent to the
/// backend.
pub const MAX_INPUT_CHARS: usize = 8_000;

/// Trait for embedding generators.
///
/// Implementations must be `Send + Sync` so a single embedder can be
/// shared across concurrently indexing/searching tasks.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimension this embedder produces.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for `text`, truncated to [`MAX_INPUT_CHARS`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TransientBackend`] if the backend is
    /// unreachable or returns a malformed response. Callers decide
    /// whether to retry; this method never retries silently.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns `0.0` if the vectors differ in length or either has zero
/// magnitude, rather than panicking.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Converts a Euclidean/L2-style distance into a `(0, 1]` similarity score.
#[must_use]
pub fn distance_to_similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Truncates `text` to at most [`MAX_INPUT_CHARS`] characters, respecting
/// UTF-8 boundaries.
#[must_use]
pub fn truncate_for_embedding(text: &str) -> &str {
    if text.chars().count() <= MAX_INPUT_CHARS {
        return text;
    }
    let mut end = text.len();
    let mut taken = 0;
    for (idx, _) in text.char_indices() {
        if taken >= MAX_INPUT_CHARS {
            end = idx;
            break;
        }
        taken += 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_length_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn distance_to_similarity_at_zero_distance_is_one() {
        assert!((distance_to_similarity(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn truncate_respects_char_limit() {
        let long = "a".repeat(MAX_INPUT_CHARS + 100);
        let truncated = truncate_for_embedding(&long);
        assert_eq!(truncated.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn truncate_is_noop_for_short_text() {
        assert_eq!(truncate_for_embedding("short"), "short");
    }
}
