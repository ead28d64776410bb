//! Storage trait definitions: a chunk-level vector store and a
//! document-level full-text store.

use crate::core::{Chunk, Document};
use crate::core::document::Vault;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// What to remove from a vector table.
#[derive(Debug, Clone)]
pub enum DeletePredicate {
    /// Remove every row (a full-table truncate).
    All,
    /// Remove every row for a given source file.
    FileHash(String),
}

/// Metadata filters pushed down to the vector store or FTS store.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Restrict to this category, if set.
    pub category: Option<String>,
    /// Restrict to documents mentioning this person, if set.
    pub person: Option<String>,
}

/// A vector search hit: the stored chunk plus its distance to the query.
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Distance to the query vector (smaller is more similar).
    pub distance: f64,
}

/// Chunk-level vector store, backing one named table per vault
/// (`"work"`, `"personal"`).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates `table` if it does not already exist. Idempotent.
    async fn create_table_if_absent(&self, table: &str) -> Result<()>;

    /// Inserts `chunks` into `table`. Callers are responsible for deleting
    /// any prior rows for the same file first.
    async fn upsert_chunks(&self, table: &str, chunks: &[Chunk]) -> Result<()>;

    /// Removes rows from `table` matching `predicate`.
    async fn delete_where(&self, table: &str, predicate: DeletePredicate) -> Result<()>;

    /// Returns the `limit` nearest chunks to `query_vector` in `table`,
    /// ordered by ascending distance, honoring `filter`.
    async fn search(
        &self,
        table: &str,
        query_vector: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<VectorHit>>;

    /// Returns the number of rows in `table`.
    async fn count(&self, table: &str) -> Result<usize>;
}

/// A full-text search hit: one document with a relevance score and a
/// short excerpt.
#[derive(Debug, Clone, Serialize)]
pub struct FtsHit {
    /// Absolute path of the matched document.
    pub file_path: String,
    /// Document title.
    pub title: String,
    /// Short excerpt from the document body.
    pub snippet: String,
    /// BM25-derived score; higher is better.
    pub score: f64,
    /// Vault the document belongs to.
    pub vault: Vault,
    /// Document category.
    pub category: String,
    /// People mentioned in the document.
    pub people: Vec<String>,
    /// Document date, if known.
    pub date: Option<String>,
}

/// Document-level full-text store, one row per indexed file.
#[async_trait]
pub trait FtsStore: Send + Sync {
    /// Replaces the row for `document.file_path` with `content`.
    async fn upsert_document(&self, document: &Document, content: &str) -> Result<()>;

    /// Removes the row for `file_path`, if present.
    async fn delete_document(&self, file_path: &str) -> Result<()>;

    /// Returns the `file_hash` currently stored for `file_path`, if any.
    /// Used by incremental indexing to detect unchanged files without
    /// re-reading every chunk.
    async fn existing_hash(&self, file_path: &str) -> Result<Option<String>>;

    /// Searches for `query`, optionally restricted to `vault` and/or to
    /// documents mentioning `person`.
    async fn search(
        &self,
        query: &str,
        vault: Option<Vault>,
        person: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FtsHit>>;

    /// Returns the number of indexed documents.
    async fn count(&self) -> Result<usize>;
}

/// Aggregate counts reported by the `status` CLI command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Chunk count in the work vector table.
    pub work_chunks: usize,
    /// Chunk count in the personal vector table.
    pub personal_chunks: usize,
    /// Document count in the FTS store.
    pub documents: usize,
    /// Current schema version.
    pub schema_version: u32,
}
