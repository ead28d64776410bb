//! `SQLite`-backed implementation of [`VectorStore`] and [`FtsStore`].
//!
//! Both stores share one database file: per-vault chunk tables for
//! vectors, and a `documents` + `documents_fts` pair for full text. Reads
//! and writes go through a single `Mutex<Connection>`; `SQLite` operations
//! are fast enough that holding the lock across one query does not block
//! the async runtime in practice for this workload size.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use crate::core::document::Vault;
use crate::core::{Chunk, Document};
use crate::embedding::{cosine_similarity, distance_to_similarity};
use crate::error::{Error, Result, StoreError};
use crate::storage::schema::{
    BASE_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SET_VERSION_SQL, VECTOR_TABLES,
    create_chunk_table_sql,
};
use crate::storage::traits::{DeletePredicate, FtsHit, FtsStore, SearchFilter, VectorHit, VectorStore};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// `SQLite`-backed vector and full-text store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates a database at `path`, creating the parent
    /// directory if needed, and applies the base schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path).map_err(StoreError::from)?;
        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        store.init()?;
        Ok(store)
    }

    /// Creates an in-memory database, for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    /// Path to the database file, `None` for in-memory instances.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store(StoreError::Database("storage lock poisoned".to_string())))
    }

    fn init(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::from)?;
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StoreError::from)?;
        conn.execute_batch(BASE_SCHEMA_SQL).map_err(StoreError::from)?;
        for table in VECTOR_TABLES {
            conn.execute_batch(&create_chunk_table_sql(table))
                .map_err(StoreError::from)?;
        }

        let version: Option<String> = conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StoreError::from)?;
        if version.is_none() {
            conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])
                .map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Current schema version recorded in the database.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.lock()?;
        let version: Option<String> = conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StoreError::from)?;
        Ok(version.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    fn validate_table(table: &str) -> Result<()> {
        if VECTOR_TABLES.contains(&table) {
            Ok(())
        } else {
            Err(Error::Store(StoreError::UnknownTable(table.to_string())))
        }
    }

    fn encode_vector(vector: &[f32]) -> Vec<u8> {
        vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn decode_vector(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn encode_list(items: &[String]) -> String {
        items.join("\u{1f}")
    }

    fn decode_list(s: &str) -> Vec<String> {
        if s.is_empty() {
            Vec::new()
        } else {
            s.split('\u{1f}').map(str::to_string).collect()
        }
    }

    fn row_to_chunk(
        id: String,
        chunk_index: i64,
        content: String,
        embedding: Vec<u8>,
        file_path: String,
        file_hash: String,
        title: String,
        category: String,
        people: String,
        projects: String,
        date: Option<String>,
        vault: Vault,
    ) -> Chunk {
        Chunk {
            id,
            chunk_index: chunk_index as usize,
            content,
            vector: Some(Self::decode_vector(&embedding)),
            file_path,
            file_hash,
            vault,
            title,
            category,
            people: Self::decode_list(&people),
            projects: Self::decode_list(&projects),
            date,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn create_table_if_absent(&self, table: &str) -> Result<()> {
        Self::validate_table(table)?;
        let conn = self.lock()?;
        conn.execute_batch(&create_chunk_table_sql(table))
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn upsert_chunks(&self, table: &str, chunks: &[Chunk]) -> Result<()> {
        Self::validate_table(table)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::from)?;
        {
            let sql = format!(
                "INSERT OR REPLACE INTO chunks_{table} \
                 (id, chunk_index, content, embedding, file_path, file_hash, title, category, people, projects, date) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            );
            let mut stmt = tx.prepare(&sql).map_err(StoreError::from)?;
            for chunk in chunks {
                let embedding = chunk
                    .vector
                    .as_ref()
                    .map(|v| Self::encode_vector(v))
                    .unwrap_or_default();
                stmt.execute(params![
                    chunk.id,
                    chunk.chunk_index as i64,
                    chunk.content,
                    embedding,
                    chunk.file_path,
                    chunk.file_hash,
                    chunk.title,
                    chunk.category,
                    Self::encode_list(&chunk.people),
                    Self::encode_list(&chunk.projects),
                    chunk.date,
                ])
                .map_err(StoreError::from)?;
            }
        }
        tx.commit().map_err(StoreError::from)?;
        Ok(())
    }

    async fn delete_where(&self, table: &str, predicate: DeletePredicate) -> Result<()> {
        Self::validate_table(table)?;
        let conn = self.lock()?;
        match predicate {
            DeletePredicate::All => {
                conn.execute(&format!("DELETE FROM chunks_{table}"), [])
                    .map_err(StoreError::from)?;
            }
            DeletePredicate::FileHash(hash) => {
                conn.execute(
                    &format!("DELETE FROM chunks_{table} WHERE file_hash = ?"),
                    params![hash],
                )
                .map_err(StoreError::from)?;
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        table: &str,
        query_vector: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<VectorHit>> {
        Self::validate_table(table)?;
        let conn = self.lock()?;

        let mut sql = format!(
            "SELECT id, chunk_index, content, embedding, file_path, file_hash, title, category, people, projects, date \
             FROM chunks_{table} WHERE 1=1"
        );
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.person.is_some() {
            sql.push_str(" AND ('\u{1f}' || people || '\u{1f}') LIKE ?");
        }

        let mut stmt = conn.prepare(&sql).map_err(StoreError::from)?;
        let vault = match table {
            "work" => Vault::Work,
            "personal" => Vault::Personal,
            _ => Vault::Unknown,
        };

        let mut rows_iter = {
            let category_param = filter.category.clone();
            let person_param = filter
                .person
                .as_ref()
                .map(|p| format!("%\u{1f}{p}\u{1f}%"));
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(c) = category_param {
                params_vec.push(Box::new(c));
            }
            if let Some(p) = person_param {
                params_vec.push(Box::new(p));
            }
            let param_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(std::convert::AsRef::as_ref).collect();
            stmt.query_map(param_refs.as_slice(), |row| {
                Ok(Self::row_to_chunk(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    vault,
                ))
            })
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?
        };

        let mut hits: Vec<VectorHit> = rows_iter
            .drain(..)
            .map(|chunk| {
                let distance = chunk
                    .vector
                    .as_ref()
                    .map(|v| 1.0 - f64::from(cosine_similarity(v, query_vector)))
                    .unwrap_or(f64::MAX);
                VectorHit { chunk, distance }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, table: &str) -> Result<usize> {
        Self::validate_table(table)?;
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM chunks_{table}"), [], |row| row.get(0))
            .map_err(StoreError::from)?;
        Ok(count as usize)
    }
}

#[async_trait]
impl FtsStore for SqliteStore {
    async fn upsert_document(&self, document: &Document, content: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO documents (file_path, file_hash, vault, title, category, people, projects, date, content, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(file_path) DO UPDATE SET
                file_hash = excluded.file_hash,
                vault = excluded.vault,
                title = excluded.title,
                category = excluded.category,
                people = excluded.people,
                projects = excluded.projects,
                date = excluded.date,
                content = excluded.content,
                updated_at = excluded.updated_at
            ",
            params![
                document.file_path,
                document.file_hash,
                document.vault.as_str(),
                document.title,
                document.category,
                Self::encode_list(&document.people),
                Self::encode_list(&document.projects),
                document.date,
                content,
                current_timestamp(),
            ],
        )
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn delete_document(&self, file_path: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM documents WHERE file_path = ?", params![file_path])
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn existing_hash(&self, file_path: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT file_hash FROM documents WHERE file_path = ?",
            params![file_path],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Store(StoreError::from(e)))
    }

    async fn search(
        &self,
        query: &str,
        vault: Option<Vault>,
        person: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FtsHit>> {
        let conn = self.lock()?;

        let fts_query = query
            .split_whitespace()
            .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ");
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT d.file_path, d.title, d.content, -bm25(documents_fts) as score, d.vault, d.category, d.people, d.date
            FROM documents_fts
            JOIN documents d ON d.rowid = documents_fts.rowid
            WHERE documents_fts MATCH ?
            ",
        );
        if vault.is_some() {
            sql.push_str(" AND d.vault = ?");
        }
        if let Some(p) = person {
            let _ = p;
            sql.push_str(" AND ('\u{1f}' || d.people || '\u{1f}') LIKE ?");
        }
        sql.push_str(" ORDER BY score DESC LIMIT ?");

        let mut stmt = conn.prepare(&sql).map_err(StoreError::from)?;

        let vault_param = vault.map(|v| v.as_str().to_string());
        let person_param = person.map(|p| format!("%\u{1f}{p}\u{1f}%"));

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(fts_query)];
        if let Some(v) = vault_param {
            params_vec.push(Box::new(v));
        }
        if let Some(p) = person_param {
            params_vec.push(Box::new(p));
        }
        params_vec.push(Box::new(limit as i64));
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(std::convert::AsRef::as_ref).collect();

        let hits = stmt
            .query_map(param_refs.as_slice(), |row| {
                let content: String = row.get(2)?;
                let vault_str: String = row.get(4)?;
                Ok(FtsHit {
                    file_path: row.get(0)?,
                    title: row.get(1)?,
                    snippet: excerpt(&content, 300),
                    score: row.get(3)?,
                    vault: Vault::parse(&vault_str),
                    category: row.get(5)?,
                    people: Self::decode_list(&row.get::<_, String>(6)?),
                    date: row.get(7)?,
                })
            })
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(StoreError::from)?;
        Ok(count as usize)
    }
}

fn excerpt(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[allow(clippy::cast_possible_wrap)]
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Vault;

    fn chunk(id: &str, content: &str, vector: Vec<f32>, category: &str, people: Vec<&str>) -> Chunk {
        Chunk {
            id: id.to_string(),
            chunk_index: 0,
            content: content.to_string(),
            vector: Some(vector),
            file_path: format!("/vault/work/{id}.md"),
            file_hash: id.to_string(),
            vault: Vault::Work,
            title: id.to_string(),
            category: category.to_string(),
            people: people.into_iter().map(str::to_string).collect(),
            projects: vec![],
            date: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_delete_by_file_hash_removes_rows() {
        let store = SqliteStore::in_memory().unwrap();
        let c = chunk("h1_0", "hello", vec![1.0, 0.0], "notes", vec![]);
        store.upsert_chunks("work", &[c]).await.unwrap();
        assert_eq!(VectorStore::count(&store, "work").await.unwrap(), 1);

        store
            .delete_where("work", DeletePredicate::FileHash("h1".to_string()))
            .await
            .unwrap();
        assert_eq!(VectorStore::count(&store, "work").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_orders_by_cosine_distance() {
        let store = SqliteStore::in_memory().unwrap();
        let near = chunk("h1_0", "close", vec![1.0, 0.0], "notes", vec![]);
        let far = chunk("h2_0", "far", vec![0.0, 1.0], "notes", vec![]);
        store.upsert_chunks("work", &[far, near]).await.unwrap();

        let hits = VectorStore::search(&store, "work", &[1.0, 0.0], 10, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(hits[0].chunk.id, "h1_0");
    }

    #[tokio::test]
    async fn search_filters_by_category() {
        let store = SqliteStore::in_memory().unwrap();
        let a = chunk("h1_0", "a", vec![1.0, 0.0], "meetings", vec![]);
        let b = chunk("h2_0", "b", vec![1.0, 0.0], "journal", vec![]);
        store.upsert_chunks("work", &[a, b]).await.unwrap();

        let filter = SearchFilter {
            category: Some("journal".to_string()),
            person: None,
        };
        let hits = VectorStore::search(&store, "work", &[1.0, 0.0], 10, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "h2_0");
    }

    #[tokio::test]
    async fn unknown_table_is_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        let result = VectorStore::count(&store, "bogus").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fts_upsert_and_search_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = Document {
            file_path: "/vault/work/sync.md".into(),
            file_hash: "h".into(),
            vault: Vault::Work,
            title: "Weekly Sync".into(),
            category: "meetings".into(),
            people: vec!["Hitesh".into()],
            projects: vec![],
            date: Some("2024-05-01".into()),
        };
        store
            .upsert_document(&doc, "We discussed the migration timeline.")
            .await
            .unwrap();

        let hits = FtsStore::search(&store, "migration", None, None, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_path, "/vault/work/sync.md");
    }

    #[tokio::test]
    async fn fts_search_returns_empty_for_no_match() {
        let store = SqliteStore::in_memory().unwrap();
        let hits = FtsStore::search(&store, "nonexistent", None, None, 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn schema_version_is_recorded() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
