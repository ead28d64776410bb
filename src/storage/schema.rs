//! Database schema.
//!
//! One SQLite file backs both stores: a chunk-level table per vault
//! (`chunks_work`, `chunks_personal`) for the vector store, and a single
//! `documents` table with an FTS5 shadow table for the full-text store.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Vector table names the store will create on first use.
pub const VECTOR_TABLES: &[&str] = &["work", "personal"];

/// Schema bootstrap, independent of the per-vault chunk tables.
pub const BASE_SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    file_path TEXT PRIMARY KEY,
    file_hash TEXT NOT NULL,
    vault TEXT NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    people TEXT NOT NULL,
    projects TEXT NOT NULL,
    date TEXT,
    content TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_vault ON documents(vault);

CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    title,
    content,
    content='documents',
    content_rowid='rowid',
    tokenize='porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
    INSERT INTO documents_fts(rowid, title, content) VALUES (new.rowid, new.title, new.content);
END;

CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, content)
        VALUES('delete', old.rowid, old.title, old.content);
END;

CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, content)
        VALUES('delete', old.rowid, old.title, old.content);
    INSERT INTO documents_fts(rowid, title, content) VALUES (new.rowid, new.title, new.content);
END;
";

/// SQL to get the schema version.
pub const GET_VERSION_SQL: &str = "SELECT value FROM schema_info WHERE key = 'version';";

/// SQL to set the schema version.
pub const SET_VERSION_SQL: &str =
    "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);";

/// Builds the `CREATE TABLE` statement for a per-vault chunk table.
///
/// `table` must come from [`VECTOR_TABLES`]; callers validate this before
/// calling so no user input ever reaches this interpolation.
#[must_use]
pub fn create_chunk_table_sql(table: &str) -> String {
    format!(
        r"
        CREATE TABLE IF NOT EXISTS chunks_{table} (
            id TEXT PRIMARY KEY,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            file_path TEXT NOT NULL,
            file_hash TEXT NOT NULL,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            people TEXT NOT NULL,
            projects TEXT NOT NULL,
            date TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_{table}_hash ON chunks_{table}(file_hash);
        CREATE INDEX IF NOT EXISTS idx_chunks_{table}_category ON chunks_{table}(category);
        "
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_schema_creates_expected_objects() {
        assert!(BASE_SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS documents"));
        assert!(BASE_SCHEMA_SQL.contains("documents_fts"));
    }

    #[test]
    fn chunk_table_sql_is_scoped_by_name() {
        let sql = create_chunk_table_sql("work");
        assert!(sql.contains("chunks_work"));
        assert!(!sql.contains("chunks_personal"));
    }

    #[test]
    fn vector_tables_are_work_and_personal() {
        assert_eq!(VECTOR_TABLES, &["work", "personal"]);
    }
}
