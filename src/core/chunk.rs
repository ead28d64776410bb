//! Chunk representation.
//!
//! A [`Chunk`] is an overlapping slice of a [`crate::core::Document`]'s body,
//! carrying the parent document's metadata so the vector store can push
//! filters (category, person) down to the query instead of post-filtering.

use crate::core::document::{Document, Vault};
use serde::{Deserialize, Serialize};

/// A chunk of a document's body, ready to be embedded and indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{file_hash}_{chunk_index}`, unique across the vector store.
    pub id: String,
    /// Zero-based position of this chunk within its document.
    pub chunk_index: usize,
    /// Chunk text.
    pub content: String,
    /// Dense embedding, `None` until the indexer has called the embedding client.
    pub vector: Option<Vec<f32>>,
    /// Absolute path of the source file.
    pub file_path: String,
    /// Content hash of the source file (shared by every chunk of that file).
    pub file_hash: String,
    /// Vault the source file belongs to.
    pub vault: Vault,
    /// Source document title.
    pub title: String,
    /// Source document category.
    pub category: String,
    /// People mentioned in the source document.
    pub people: Vec<String>,
    /// Projects mentioned in the source document.
    pub projects: Vec<String>,
    /// Source document date, if known.
    pub date: Option<String>,
}

impl Chunk {
    /// Builds the chunk id for a given file hash and chunk index.
    #[must_use]
    pub fn id_for(file_hash: &str, chunk_index: usize) -> String {
        format!("{file_hash}_{chunk_index}")
    }

    /// Creates a chunk from a parent document and its body slice.
    #[must_use]
    pub fn new(document: &Document, chunk_index: usize, content: String) -> Self {
        Self {
            id: Self::id_for(&document.file_hash, chunk_index),
            chunk_index,
            content,
            vector: None,
            file_path: document.file_path.clone(),
            file_hash: document.file_hash.clone(),
            vault: document.vault,
            title: document.title.clone(),
            category: document.category.clone(),
            people: document.people.clone(),
            projects: document.projects.clone(),
            date: document.date.clone(),
        }
    }

    /// Returns a preview of the chunk content, truncated at a UTF-8 boundary.
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }

    /// Returns true if `person` (case-insensitive) is in this chunk's people list.
    #[must_use]
    pub fn mentions_person(&self, person: &str) -> bool {
        self.people.iter().any(|p| p.eq_ignore_ascii_case(person))
    }
}
