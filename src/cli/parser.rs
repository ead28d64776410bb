//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// noteseeker: hybrid vector + BM25 retrieval over personal markdown vaults.
#[derive(Parser, Debug)]
#[command(name = "noteseeker")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, env = "NOTESEEKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: text, json, or ndjson.
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk vault(s) and (re)index their markdown files.
    Index {
        /// Skip files whose content hash hasn't changed since the last
        /// pass, instead of clearing and re-ingesting everything.
        #[arg(long)]
        incremental: bool,

        /// Which vault(s) to index: all, work, or personal.
        #[arg(long, default_value = "all")]
        vault: String,
    },

    /// Search indexed notes.
    Search {
        /// The search query text.
        query: String,

        /// Vault scope: all, work, or personal.
        #[arg(long, default_value = "all")]
        scope: String,

        /// Search mode: vector, bm25, hybrid, or query.
        #[arg(long, default_value = "hybrid")]
        mode: String,

        /// Restrict to a category (vector search only).
        #[arg(long)]
        category: Option<String>,

        /// Restrict to notes mentioning this person.
        #[arg(long)]
        person: Option<String>,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Ask a question, answered from retrieved context.
    Ask {
        /// The question to answer.
        question: String,

        /// Vault scope: all, work, or personal.
        #[arg(long, default_value = "all")]
        scope: String,

        /// Search mode used to retrieve context: vector, bm25, hybrid, or query.
        #[arg(long, default_value = "query")]
        mode: String,
    },

    /// Summarize what's known about a person across both vaults.
    Person {
        /// The person's name, as it appears in notes.
        name: String,
    },

    /// List open action items extracted from notes.
    Actions {
        /// Restrict to action items associated with this person.
        #[arg(long)]
        person: Option<String>,

        /// Maximum number of action items.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show index and store status.
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_parses_with_defaults() {
        let cli = Cli::parse_from(["noteseeker", "search", "migration plan"]);
        match cli.command {
            Commands::Search { query, scope, mode, limit, .. } => {
                assert_eq!(query, "migration plan");
                assert_eq!(scope, "all");
                assert_eq!(mode, "hybrid");
                assert_eq!(limit, 10);
            }
            other => panic!("expected Search, got {other:?}"),
        }
    }

    #[test]
    fn index_incremental_flag_parses() {
        let cli = Cli::parse_from(["noteseeker", "index", "--incremental", "--vault", "work"]);
        match cli.command {
            Commands::Index { incremental, vault } => {
                assert!(incremental);
                assert_eq!(vault, "work");
            }
            other => panic!("expected Index, got {other:?}"),
        }
    }

    #[test]
    fn index_defaults_to_full_reindex_of_all_vaults() {
        let cli = Cli::parse_from(["noteseeker", "index"]);
        match cli.command {
            Commands::Index { incremental, vault } => {
                assert!(!incremental);
                assert_eq!(vault, "all");
            }
            other => panic!("expected Index, got {other:?}"),
        }
    }
}
