//! Layered configuration: built-in defaults, an optional TOML file, then
//! environment variable overrides (highest precedence).
//!
//! Required values (vault roots) produce a [`crate::Error::Config`] at
//! startup; nothing about configuration is resolved lazily at request time.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Chunking parameters, in approximate tokens (see [`crate::chunking`]).
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size, in approximate tokens.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap carried into the next chunk, in approximate tokens.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

const fn default_chunk_size() -> usize {
    500
}

const fn default_chunk_overlap() -> usize {
    50
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name passed to the embedding backend.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected embedding dimension.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    /// Base URL of the Ollama-style embedding/rerank backend.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            ollama_url: default_ollama_url(),
        }
    }
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_embedding_dimension() -> usize {
    768
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Reranker and query-expansion backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankConfig {
    /// Model name passed to the rerank backend.
    #[serde(default = "default_rerank_model")]
    pub model: String,
    /// Maximum concurrent rerank judgments.
    #[serde(default = "default_rerank_concurrency")]
    pub concurrency: usize,
    /// Candidates passed through reranking before truncation.
    #[serde(default = "default_rerank_top_k")]
    pub top_k: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: default_rerank_model(),
            concurrency: default_rerank_concurrency(),
            top_k: default_rerank_top_k(),
        }
    }
}

fn default_rerank_model() -> String {
    "qwen2.5:0.5b".to_string()
}

const fn default_rerank_concurrency() -> usize {
    5
}

const fn default_rerank_top_k() -> usize {
    30
}

/// Answer-synthesis LLM gateway configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnswerLlmConfig {
    /// Base URL of the OpenAI-compatible gateway.
    #[serde(default)]
    pub url: Option<String>,
    /// Bearer token for the gateway.
    #[serde(default)]
    pub token: Option<String>,
}

/// Top-level configuration for a `noteseeker` process.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory of the work vault.
    pub vault_work_path: PathBuf,
    /// Root directory of the personal vault.
    pub vault_personal_path: PathBuf,
    /// Path substrings that exclude a file from indexing.
    #[serde(default = "default_excluded_folders")]
    pub excluded_folders: Vec<String>,
    /// Path to the SQLite database backing both stores.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Chunking parameters.
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding backend parameters.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Rerank backend parameters.
    #[serde(default)]
    pub rerank: RerankConfig,
    /// Answer-synthesis LLM gateway parameters.
    #[serde(default)]
    pub llm: AnswerLlmConfig,
    /// Maximum chunks included as context for `query_with_llm`.
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
    /// Log level passed to the tracing subscriber (`RUST_LOG` takes precedence).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_excluded_folders() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        ".obsidian".to_string(),
        "templates".to_string(),
    ]
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".noteseeker/index.db")
}

const fn default_max_context_chunks() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads configuration from an optional TOML file, then applies
    /// environment variable overrides. Vault roots are required: supplied
    /// either in the file or via `VAULT_WORK_PATH`/`VAULT_PERSONAL_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be parsed or a required
    /// value is missing after all layers are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let raw = match path {
            Some(p) => std::fs::read_to_string(p)
                .map_err(|e| Error::Config(format!("cannot read config file {}: {e}", p.display())))?,
            None => String::new(),
        };

        let mut config: Self = if raw.trim().is_empty() {
            Self::from_env_only()?
        } else {
            toml::from_str(&raw).map_err(|e| Error::Config(format!("invalid config file: {e}")))?
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Builds a config purely from environment variables plus defaults,
    /// used when no config file is given.
    fn from_env_only() -> Result<Self> {
        let vault_work_path = std::env::var("VAULT_WORK_PATH")
            .map(PathBuf::from)
            .unwrap_or_default();
        let vault_personal_path = std::env::var("VAULT_PERSONAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_default();

        Ok(Self {
            vault_work_path,
            vault_personal_path,
            excluded_folders: default_excluded_folders(),
            db_path: default_db_path(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            rerank: RerankConfig::default(),
            llm: AnswerLlmConfig::default(),
            max_context_chunks: default_max_context_chunks(),
            log_level: default_log_level(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VAULT_WORK_PATH") {
            self.vault_work_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VAULT_PERSONAL_PATH") {
            self.vault_personal_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("OLLAMA_URL") {
            self.embedding.ollama_url = v;
        }
        if let Ok(v) = std::env::var("NOTESEEKER_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CLAWDBOT_URL") {
            self.llm.url = Some(v);
        }
        if let Ok(v) = std::env::var("CLAWDBOT_TOKEN") {
            self.llm.token = Some(v);
        }
        if let Ok(v) = std::env::var("RUST_LOG") {
            self.log_level = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.vault_work_path.as_os_str().is_empty()
            && self.vault_personal_path.as_os_str().is_empty()
        {
            return Err(Error::Config(
                "at least one of vault_work_path/vault_personal_path must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let toml_str = r#"
            vault_work_path = "/notes/work"
            vault_personal_path = "/notes/personal"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.rerank.concurrency, 5);
    }

    #[test]
    fn validate_rejects_empty_vaults() {
        let config = Config {
            vault_work_path: PathBuf::new(),
            vault_personal_path: PathBuf::new(),
            excluded_folders: vec![],
            db_path: default_db_path(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            rerank: RerankConfig::default(),
            llm: AnswerLlmConfig::default(),
            max_context_chunks: 8,
            log_level: "info".into(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_take_env_precedence() {
        // SAFETY: test-only, single-threaded access to process env for this key.
        unsafe {
            std::env::set_var("OLLAMA_URL", "http://example.test:1234");
        }
        let mut config = Config {
            vault_work_path: PathBuf::from("/w"),
            vault_personal_path: PathBuf::from("/p"),
            excluded_folders: vec![],
            db_path: default_db_path(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            rerank: RerankConfig::default(),
            llm: AnswerLlmConfig::default(),
            max_context_chunks: 8,
            log_level: "info".into(),
        };
        config.apply_env_overrides();
        assert_eq!(config.embedding.ollama_url, "http://example.test:1234");
        // SAFETY: test-only cleanup.
        unsafe {
            std::env::remove_var("OLLAMA_URL");
        }
    }
}
