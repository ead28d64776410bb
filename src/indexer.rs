//! Vault indexing: walks vault roots, parses and chunks each file, and
//! writes vectors and full-text rows to storage.

use crate::chunking::chunk_document;
use crate::config::Config;
use crate::core::document::Vault;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::parser::parse_document;
use crate::storage::{DeletePredicate, FtsStore, VectorStore};
use crate::vault::walk_markdown_files;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of one indexing pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    /// Files walked across both vaults.
    pub files_seen: usize,
    /// Files that produced at least one chunk.
    pub files_indexed: usize,
    /// Files skipped (too short, unreadable, malformed, or unchanged).
    pub files_skipped: usize,
    /// Total chunks written to the vector store.
    pub chunks_written: usize,
    /// Set if the pass was cancelled before completing.
    pub cancelled: bool,
}

/// Shared cooperative-cancellation flag for an in-progress index pass.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Takes effect at the next poll point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Orchestrates the walk -> parse -> chunk -> embed -> store pipeline.
pub struct Indexer<V, F, E> {
    vector_store: Arc<V>,
    fts_store: Arc<F>,
    embedder: Arc<E>,
    config: Config,
}

impl<V, F, E> Indexer<V, F, E>
where
    V: VectorStore,
    F: FtsStore,
    E: Embedder,
{
    /// Creates a new indexer over the given stores, embedder, and config.
    pub fn new(vector_store: Arc<V>, fts_store: Arc<F>, embedder: Arc<E>, config: Config) -> Self {
        Self {
            vector_store,
            fts_store,
            embedder,
            config,
        }
    }

    /// Re-indexes every markdown file in `vault` (`"all"`, `"work"`, or
    /// `"personal"`) from scratch, clearing the target table(s) first.
    ///
    /// # Errors
    ///
    /// Returns an error if a vector table cannot be created or cleared.
    /// Per-file failures are logged and counted as skipped, not propagated.
    pub async fn full_reindex(&self, vault: &str, cancel: &CancelToken) -> Result<IndexReport> {
        for table in self.tables_for(vault) {
            self.vector_store.create_table_if_absent(table).await?;
            self.vector_store
                .delete_where(table, DeletePredicate::All)
                .await?;
        }
        self.index_files(self.discover_files(vault), cancel, false).await
    }

    /// Indexes `vault` (`"all"`, `"work"`, or `"personal"`), skipping any
    /// file whose current content hash matches what's already stored for
    /// its path. Unrelated rows are left untouched.
    ///
    /// # Errors
    ///
    /// See [`Self::full_reindex`].
    pub async fn incremental_index(&self, vault: &str, cancel: &CancelToken) -> Result<IndexReport> {
        for table in self.tables_for(vault) {
            self.vector_store.create_table_if_absent(table).await?;
        }
        self.index_files(self.discover_files(vault), cancel, true).await
    }

    fn tables_for(&self, vault: &str) -> Vec<&'static str> {
        let mut tables = Vec::with_capacity(2);
        if vault == "all" || vault == "work" {
            tables.push("work");
        }
        if vault == "all" || vault == "personal" {
            tables.push("personal");
        }
        tables
    }

    fn discover_files(&self, vault: &str) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if vault == "all" || vault == "work" {
            files.extend(walk_markdown_files(&self.config.vault_work_path, &self.config.excluded_folders));
        }
        if vault == "all" || vault == "personal" {
            files.extend(walk_markdown_files(
                &self.config.vault_personal_path,
                &self.config.excluded_folders,
            ));
        }
        files
    }

    async fn index_files(
        &self,
        files: Vec<PathBuf>,
        cancel: &CancelToken,
        skip_unchanged: bool,
    ) -> Result<IndexReport> {
        let mut report = IndexReport {
            files_seen: files.len(),
            ..IndexReport::default()
        };

        for (i, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if i % 10 == 0 {
                tokio::task::yield_now().await;
            }

            match self.index_one_file(path, cancel, skip_unchanged).await {
                Ok(Some(chunk_count)) => {
                    report.files_indexed += 1;
                    report.chunks_written += chunk_count;
                }
                Ok(None) => report.files_skipped += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping file after indexing error");
                    report.files_skipped += 1;
                }
            }
        }

        info!(
            files_seen = report.files_seen,
            files_indexed = report.files_indexed,
            files_skipped = report.files_skipped,
            chunks_written = report.chunks_written,
            cancelled = report.cancelled,
            "index pass complete"
        );
        Ok(report)
    }

    /// Returns `Ok(Some(chunk_count))` if the file was (re)indexed,
    /// `Ok(None)` if it was skipped (too short, unreadable, or, when
    /// `skip_unchanged` is set, unchanged since the last pass).
    async fn index_one_file(
        &self,
        path: &Path,
        cancel: &CancelToken,
        skip_unchanged: bool,
    ) -> Result<Option<usize>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                return Ok(None);
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let file_hash = hash_content(&content);

        let (document, body) = parse_document(
            &content,
            path,
            &file_hash,
            &self.config.vault_work_path,
            &self.config.vault_personal_path,
        );

        let previous_hash = self.fts_store.existing_hash(&document.file_path).await.unwrap_or(None);
        if skip_unchanged && previous_hash.as_deref() == Some(file_hash.as_str()) {
            return Ok(None);
        }

        let chunks = chunk_document(
            &document,
            &body,
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        );
        if chunks.is_empty() {
            return Ok(None);
        }

        let mut embedded = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            if cancel.is_cancelled() {
                break;
            }
            match self.embedder.embed(&chunk.content).await {
                Ok(vector) => {
                    chunk.vector = Some(vector);
                    embedded.push(chunk);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        chunk_index = chunk.chunk_index,
                        error = %e,
                        "embedding failed for chunk, skipping it"
                    );
                }
            }
        }
        if embedded.is_empty() {
            return Ok(None);
        }

        let table = match document.vault {
            Vault::Work => "work",
            Vault::Personal => "personal",
            Vault::Unknown => {
                warn!(path = %path.display(), "file outside both vault roots, skipping");
                return Ok(None);
            }
        };

        // The rows to replace are tagged with the file's previous hash,
        // not the one we're about to write.
        let delete_hash = previous_hash.unwrap_or_else(|| file_hash.clone());
        self.vector_store
            .delete_where(table, DeletePredicate::FileHash(delete_hash))
            .await?;
        self.vector_store.upsert_chunks(table, &embedded).await?;

        if let Err(e) = self.fts_store.upsert_document(&document, &body).await {
            warn!(path = %path.display(), error = %e, "full-text upsert failed, vectors still written");
        }

        Ok(Some(embedded.len()))
    }
}

fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
