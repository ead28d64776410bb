//! CLI command implementations.
//!
//! Builds the config, stores, embedder, indexer, and searcher, then
//! dispatches to the requested subcommand.

use crate::cli::output::{
    OutputFormat, format_action_items, format_ask, format_index_report, format_person_context,
    format_search_results, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::embedding::OllamaEmbedder;
use crate::error::Result;
use crate::indexer::{CancelToken, Indexer};
use crate::search::{SearchMode, Searcher, VaultScope};
use crate::storage::{FtsStore, SqliteStore, StoreStats, VectorStore};
use std::sync::Arc;

/// Executes the requested CLI command and returns its rendered output.
///
/// # Errors
///
/// Returns an error if the config fails to load, the store cannot be
/// opened, or the dispatched command fails.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = Config::load(cli.config.as_deref())?;
    crate::logging::init(&config.log_level);

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let embedder = Arc::new(OllamaEmbedder::new(
        config.embedding.ollama_url.clone(),
        config.embedding.model.clone(),
        config.embedding.dimension,
    ));

    match &cli.command {
        Commands::Index { incremental, vault } => {
            cmd_index(store, embedder, config, *incremental, vault, format).await
        }
        Commands::Search { query, scope, mode, category, person, limit } => {
            cmd_search(
                store,
                embedder,
                config,
                query,
                scope,
                mode,
                category.as_deref(),
                person.as_deref(),
                *limit,
                format,
            )
            .await
        }
        Commands::Ask { question, scope, mode } => {
            cmd_ask(store, embedder, config, question, scope, mode, format).await
        }
        Commands::Person { name } => cmd_person(store, embedder, config, name, format).await,
        Commands::Actions { person, limit } => {
            cmd_actions(store, embedder, config, person.as_deref(), *limit, format).await
        }
        Commands::Status => cmd_status(store, format).await,
    }
}

async fn cmd_index(
    store: Arc<SqliteStore>,
    embedder: Arc<OllamaEmbedder>,
    config: Config,
    incremental: bool,
    vault: &str,
    format: OutputFormat,
) -> Result<String> {
    let indexer = Indexer::new(Arc::clone(&store), store, embedder, config);
    let cancel = CancelToken::new();

    let report = if incremental {
        indexer.incremental_index(vault, &cancel).await?
    } else {
        indexer.full_reindex(vault, &cancel).await?
    };

    Ok(format_index_report(&report, format))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_search(
    store: Arc<SqliteStore>,
    embedder: Arc<OllamaEmbedder>,
    config: Config,
    query: &str,
    scope: &str,
    mode: &str,
    category: Option<&str>,
    person: Option<&str>,
    limit: usize,
    format: OutputFormat,
) -> Result<String> {
    let searcher = Searcher::new(Arc::clone(&store), store, embedder, config);
    let results = searcher
        .search(query, VaultScope::parse(scope), category, person, limit, SearchMode::parse(mode))
        .await?;
    Ok(format_search_results(&results, query, format))
}

async fn cmd_ask(
    store: Arc<SqliteStore>,
    embedder: Arc<OllamaEmbedder>,
    config: Config,
    question: &str,
    scope: &str,
    mode: &str,
    format: OutputFormat,
) -> Result<String> {
    let searcher = Searcher::new(Arc::clone(&store), store, embedder, config);
    let (answer, sources) = searcher
        .query_with_llm(question, VaultScope::parse(scope), SearchMode::parse(mode))
        .await?;
    Ok(format_ask(&answer, &sources, format))
}

async fn cmd_person(
    store: Arc<SqliteStore>,
    embedder: Arc<OllamaEmbedder>,
    config: Config,
    name: &str,
    format: OutputFormat,
) -> Result<String> {
    let searcher = Searcher::new(Arc::clone(&store), store, embedder, config);
    let context = searcher.get_person_context(name).await?;
    Ok(format_person_context(&context, format))
}

async fn cmd_actions(
    store: Arc<SqliteStore>,
    embedder: Arc<OllamaEmbedder>,
    config: Config,
    person: Option<&str>,
    limit: usize,
    format: OutputFormat,
) -> Result<String> {
    let searcher = Searcher::new(Arc::clone(&store), store, embedder, config);
    let items = searcher.get_action_items(person, limit).await?;
    Ok(format_action_items(&items, format))
}

async fn cmd_status(store: Arc<SqliteStore>, format: OutputFormat) -> Result<String> {
    let stats = StoreStats {
        work_chunks: VectorStore::count(store.as_ref(), "work").await?,
        personal_chunks: VectorStore::count(store.as_ref(), "personal").await?,
        documents: FtsStore::count(store.as_ref()).await?,
        schema_version: store.schema_version()?,
    };
    Ok(format_status(&stats, format))
}
