//! Error types for the retrieval pipeline.
//!
//! The taxonomy mirrors how each error should be handled by its caller:
//! transient backend failures degrade gracefully, malformed input is
//! skipped, config errors are fatal at startup, store errors abort one
//! file's indexing pass, and cancellation is not an error at all.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for retrieval operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An external backend (embedding, rerank, or answer LLM) is unreachable,
    /// timed out, or returned a malformed response. Callers should degrade
    /// gracefully rather than propagate this to the end user.
    #[error("backend unavailable: {0}")]
    TransientBackend(#[from] BackendError),

    /// Input that could not be parsed or was too short to index. Never
    /// fatal; the indexer logs and skips the offending file or chunk.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Missing or invalid configuration, detected at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A vector or FTS store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The operation was cancelled cooperatively; not a failure.
    #[error("cancelled")]
    Cancelled,

    /// I/O failure outside the per-file pipeline (e.g. walking a vault root).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the embedding, rerank, or answer-LLM HTTP clients.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The HTTP request itself failed (connection refused, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend responded with a non-success status code.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body, for diagnostics.
        body: String,
    },

    /// The backend's response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Errors from the vector store and FTS store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database returned an error.
    #[error("database error: {0}")]
    Database(String),

    /// A named vector table (`work`/`personal`) does not exist.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Serialization of a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_transient_backend() {
        let err = Error::TransientBackend(BackendError::Request("timeout".into()));
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn display_malformed_input() {
        let err = Error::MalformedInput("bad frontmatter".into());
        assert_eq!(err.to_string(), "malformed input: bad frontmatter");
    }

    #[test]
    fn display_config() {
        let err = Error::Config("missing vault_work_path".into());
        assert_eq!(
            err.to_string(),
            "configuration error: missing vault_work_path"
        );
    }

    #[test]
    fn display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn backend_error_status_display() {
        let err = BackendError::Status {
            status: 503,
            body: "overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn store_error_from_rusqlite() {
        let e: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(e, StoreError::Database(_)));
    }

    #[test]
    fn error_from_rusqlite_wraps_store() {
        let e: Error = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(e, Error::Store(StoreError::Database(_))));
    }

    #[test]
    fn error_from_store_error() {
        let e: Error = StoreError::UnknownTable("bogus".into()).into();
        assert!(err_is_store(&e));
    }

    fn err_is_store(e: &Error) -> bool {
        matches!(e, Error::Store(_))
    }
}
