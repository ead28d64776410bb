//! Storage layer: a chunk-level vector store and a document-level
//! full-text store, both backed by one `SQLite` file.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, VECTOR_TABLES};
pub use sqlite::SqliteStore;
pub use traits::{DeletePredicate, FtsHit, FtsStore, SearchFilter, StoreStats, VectorHit, VectorStore};

/// Default database file name.
pub const DEFAULT_DB_NAME: &str = "noteseeker.db";
