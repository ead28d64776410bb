//! # noteseeker
//!
//! A hybrid vector + BM25 retrieval engine over personal markdown vaults.
//!
//! noteseeker indexes markdown notes from a "work" vault and a
//! "personal" vault into a single `SQLite` database, combining dense
//! vector search with BM25 full-text search (fused by reciprocal rank
//! fusion), with an optional LLM query-expansion and reranking pass for
//! the highest-quality retrieval mode.
//!
//! ## Modules
//!
//! - [`parser`] / [`chunking`]: frontmatter-aware markdown parsing and
//!   overlap-preserving chunking.
//! - [`storage`]: `SQLite`-backed vector tables and an FTS5 document index.
//! - [`search`]: vector, BM25, hybrid, and the full query pipeline.
//! - [`indexer`]: the walk -> parse -> chunk -> embed -> store pipeline.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod llm;
pub mod logging;
pub mod parser;
pub mod search;
pub mod storage;
pub mod vault;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, Document, Vault};

// Re-export config
pub use config::Config;

// Re-export storage types
pub use storage::{DEFAULT_DB_NAME, FtsStore, SqliteStore, StoreStats, VectorStore};

// Re-export chunking
pub use chunking::chunk_document;

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding types
pub use embedding::{DEFAULT_DIMENSIONS, Embedder, HashEmbedder, OllamaEmbedder, cosine_similarity};

// Re-export indexing types
pub use indexer::{CancelToken, IndexReport, Indexer};

// Re-export search types
pub use search::{ActionItem, PersonContext, SearchMode, SearchResult, Searcher, Source, VaultScope};

// Re-export the answer-LLM gateway
pub use llm::{AnswerLlmClient, build_prompt};
