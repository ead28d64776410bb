//! Search: vector, BM25, hybrid (RRF-fused), and the full query pipeline
//! (query expansion + hybrid + reranking), plus the person-context and
//! action-item views built on top of it.

pub mod fusion;
pub mod rerank;

pub use rerank::RerankerClient;

use crate::config::Config;
use crate::core::document::Vault;
use crate::embedding::{Embedder, distance_to_similarity};
use crate::error::Result;
use crate::llm::{AnswerLlmClient, build_prompt};
use crate::storage::{FtsStore, SearchFilter, VectorStore};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Which vault(s) a search should run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultScope {
    /// Search both vaults.
    All,
    /// Search only the work vault.
    Work,
    /// Search only the personal vault.
    Personal,
}

impl VaultScope {
    /// Parses a CLI/config scope string. Unrecognized input falls back to `All`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "work" => Self::Work,
            "personal" => Self::Personal,
            _ => Self::All,
        }
    }

    fn vector_tables(self) -> &'static [&'static str] {
        match self {
            Self::All => &["work", "personal"],
            Self::Work => &["work"],
            Self::Personal => &["personal"],
        }
    }

    fn vault(self) -> Option<Vault> {
        match self {
            Self::All => None,
            Self::Work => Some(Vault::Work),
            Self::Personal => Some(Vault::Personal),
        }
    }
}

/// Which search strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Pure vector (semantic) search.
    Vector,
    /// Pure BM25 (keyword) search.
    Bm25,
    /// BM25 + vector, fused with RRF. The recommended default.
    Hybrid,
    /// Query expansion + hybrid + LLM reranking. Slowest, highest quality.
    Query,
}

impl SearchMode {
    /// Parses a CLI mode string, defaulting to `Hybrid` on unrecognized input.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "vector" => Self::Vector,
            "bm25" => Self::Bm25,
            "query" => Self::Query,
            _ => Self::Hybrid,
        }
    }
}

/// One ranked search hit, normalized across vector and BM25 sources.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Fused/source relevance score; higher is better.
    pub score: f64,
    /// Absolute path of the matched document.
    pub file_path: String,
    /// Document title.
    pub title: String,
    /// Short excerpt used as context and for display.
    pub excerpt: String,
    /// Document date, if known.
    pub date: Option<String>,
    /// People mentioned in the document.
    pub people: Vec<String>,
    /// Document category.
    pub category: String,
    /// Vault the document belongs to.
    pub vault: Vault,
}

const EXCERPT_CHARS: usize = 300;

fn excerpt(content: &str) -> String {
    excerpt_chars(content, EXCERPT_CHARS)
}

fn excerpt_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// A source citation returned alongside an LLM-synthesized answer.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    /// Absolute path of the cited document.
    pub file: String,
    /// Document title.
    pub title: String,
    /// Short excerpt, truncated further for display.
    pub excerpt: String,
}

/// A recent meeting summary returned by [`Searcher::get_person_context`].
#[derive(Debug, Clone, Serialize)]
pub struct RecentMeeting {
    /// Meeting date, if known.
    pub date: Option<String>,
    /// Document title.
    pub title: String,
    /// Short summary excerpt.
    pub summary: String,
}

/// Aggregated context about a person, derived from recent mentions.
#[derive(Debug, Clone, Serialize)]
pub struct PersonContext {
    /// The person this context is about.
    pub person: String,
    /// Number of distinct documents mentioning them.
    pub meeting_count: usize,
    /// Most recent known date among those documents.
    pub last_meeting: Option<String>,
    /// Document titles mentioning them, most relevant first.
    pub recent_topics: Vec<String>,
    /// Lines that look like action items addressed to them.
    pub open_actions: Vec<String>,
    /// The most recent meetings, summarized.
    pub recent_meetings: Vec<RecentMeeting>,
}

/// An action item extracted from a bulleted line in a document.
#[derive(Debug, Clone, Serialize)]
pub struct ActionItem {
    /// The action item text.
    pub item: String,
    /// Source document date, if known.
    pub date: Option<String>,
    /// Source document title.
    pub source: String,
}

/// Orchestrates search across the vector store, the FTS store, the
/// reranker, and the answer-synthesis LLM.
pub struct Searcher<V, F, E> {
    vector_store: Arc<V>,
    fts_store: Arc<F>,
    embedder: Arc<E>,
    reranker: RerankerClient,
    llm: Option<AnswerLlmClient>,
    config: Config,
}

impl<V, F, E> Searcher<V, F, E>
where
    V: VectorStore,
    F: FtsStore,
    E: Embedder,
{
    /// Builds a searcher from its stores, embedder, and config. The answer
    /// LLM client is only constructed if `config.llm.url` is set.
    pub fn new(vector_store: Arc<V>, fts_store: Arc<F>, embedder: Arc<E>, config: Config) -> Self {
        let reranker = RerankerClient::new(config.embedding.ollama_url.clone(), config.rerank.model.clone());
        let llm = config
            .llm
            .url
            .clone()
            .map(|url| AnswerLlmClient::new(url, config.llm.token.clone()));
        Self {
            vector_store,
            fts_store,
            embedder,
            reranker,
            llm,
            config,
        }
    }

    /// Pure vector (semantic) search.
    ///
    /// Degrades to an empty result list (logged at WARN/ERROR) if the
    /// embedder or a vector table lookup fails, rather than failing the
    /// whole call — so a down embedding backend doesn't take out
    /// [`Self::hybrid_search`]'s BM25 branch too.
    ///
    /// # Errors
    ///
    /// Never returns an error; kept `Result` for API symmetry with
    /// [`Self::bm25_search`] and room for future non-backend failures.
    pub async fn vector_search(
        &self,
        query: &str,
        scope: VaultScope,
        category: Option<&str>,
        person: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "embedding query failed, vector search returning empty");
                return Ok(Vec::new());
            }
        };
        let filter = SearchFilter {
            category: category.map(str::to_string),
            person: person.map(str::to_string),
        };

        let mut results = Vec::new();
        for table in scope.vector_tables() {
            match self.vector_store.search(table, &query_vector, limit, &filter).await {
                Ok(hits) => results.extend(hits.into_iter().map(|hit| SearchResult {
                    score: distance_to_similarity(hit.distance),
                    file_path: hit.chunk.file_path,
                    title: hit.chunk.title,
                    excerpt: excerpt(&hit.chunk.content),
                    date: hit.chunk.date,
                    people: hit.chunk.people,
                    category: hit.chunk.category,
                    vault: hit.chunk.vault,
                })),
                Err(e) => {
                    tracing::error!(table, error = %e, "vector table search failed, skipping table");
                }
            }
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        Ok(results)
    }

    /// Pure BM25 (keyword) search.
    ///
    /// Degrades to an empty result list (logged at ERROR) if the FTS
    /// store fails, rather than failing the whole call.
    ///
    /// # Errors
    ///
    /// Never returns an error; kept `Result` for API symmetry with
    /// [`Self::vector_search`].
    pub async fn bm25_search(
        &self,
        query: &str,
        scope: VaultScope,
        person: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let hits = match self.fts_store.search(query, scope.vault(), person, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!(error = %e, "fts search failed, bm25 search returning empty");
                return Ok(Vec::new());
            }
        };
        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                score: hit.score,
                file_path: hit.file_path,
                title: hit.title,
                excerpt: hit.snippet,
                date: hit.date,
                people: hit.people,
                category: hit.category,
                vault: hit.vault,
            })
            .collect())
    }

    /// BM25 + vector search fused with RRF, then min-max normalized. The
    /// recommended default search mode.
    ///
    /// Since [`Self::bm25_search`] and [`Self::vector_search`] never
    /// error, a failing backend surfaces here as an empty branch, not a
    /// failed join: hybrid search still returns whatever the surviving
    /// branch found.
    ///
    /// # Errors
    ///
    /// Never returns an error; kept `Result` for API symmetry with the
    /// other search modes.
    pub async fn hybrid_search(
        &self,
        query: &str,
        scope: VaultScope,
        category: Option<&str>,
        person: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let (bm25, vector) = tokio::join!(
            self.bm25_search(query, scope, person, 30),
            self.vector_search(query, scope, category, person, 30)
        );
        let bm25 = bm25.unwrap_or_default();
        let vector = vector.unwrap_or_default();

        info!(bm25 = bm25.len(), vector = vector.len(), "hybrid search");

        let mut fused = fusion::reciprocal_rank_fusion(&[bm25, vector], fusion::DEFAULT_K, true);
        fusion::normalize_scores(&mut fused);
        fused.truncate(limit);
        Ok(fused)
    }

    /// Query expansion + hybrid search across each expanded query + LLM
    /// reranking of the fused top candidates. The highest-quality, slowest
    /// search mode.
    ///
    /// # Errors
    ///
    /// Returns an error if hybrid search fails for any expanded query.
    pub async fn query_search(
        &self,
        query: &str,
        scope: VaultScope,
        category: Option<&str>,
        person: Option<&str>,
        limit: usize,
        use_reranking: bool,
        use_query_expansion: bool,
    ) -> Result<Vec<SearchResult>> {
        let queries = if use_query_expansion {
            self.reranker.expand_query(query).await
        } else {
            vec![query.to_string()]
        };
        info!(?queries, "query expansion");

        let mut all_results = Vec::with_capacity(queries.len());
        for q in &queries {
            all_results.push(self.hybrid_search(q, scope, category, person, 30).await?);
        }

        if all_results.len() > 1 {
            all_results.insert(0, all_results[0].clone());
        }

        let mut fused = fusion::reciprocal_rank_fusion(&all_results, fusion::DEFAULT_K, true);

        if use_reranking && !fused.is_empty() {
            let candidates: Vec<(String, String)> = fused
                .iter()
                .map(|r| (r.file_path.clone(), r.excerpt.clone()))
                .collect();
            let scores = self
                .reranker
                .rerank(query, &candidates, self.config.rerank.top_k, self.config.rerank.concurrency)
                .await;
            info!(count = scores.len(), "reranked documents");
            fused = fusion::position_aware_blend(fused, &scores);
        }

        fused.truncate(limit);
        Ok(fused)
    }

    /// Dispatches to the requested [`SearchMode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatched search fails.
    pub async fn search(
        &self,
        query: &str,
        scope: VaultScope,
        category: Option<&str>,
        person: Option<&str>,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>> {
        match mode {
            SearchMode::Vector => self.vector_search(query, scope, category, person, limit).await,
            SearchMode::Bm25 => self.bm25_search(query, scope, person, limit).await,
            SearchMode::Query => {
                self.query_search(query, scope, category, person, limit, true, true).await
            }
            SearchMode::Hybrid => self.hybrid_search(query, scope, category, person, limit).await,
        }
    }

    /// Retrieval-augmented answer synthesis: runs `search_mode` for
    /// context, then asks the answer LLM gateway to synthesize an answer.
    /// Degrades to a context dump if no gateway is configured or the
    /// gateway call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying search fails (LLM failures
    /// degrade gracefully instead of propagating).
    pub async fn query_with_llm(
        &self,
        question: &str,
        scope: VaultScope,
        search_mode: SearchMode,
    ) -> Result<(String, Vec<Source>)> {
        let results = self
            .search(question, scope, None, None, self.config.max_context_chunks, search_mode)
            .await?;

        if results.is_empty() {
            return Ok(("I couldn't find any relevant information in your notes.".to_string(), vec![]));
        }

        let mut context_parts = Vec::new();
        let mut sources = Vec::new();

        for (i, result) in results.iter().enumerate() {
            if self
                .config
                .excluded_folders
                .iter()
                .any(|f| result.file_path.contains(f.as_str()))
            {
                continue;
            }

            context_parts.push(format!(
                "[Source {}: {} ({})]",
                i + 1,
                result.title,
                result.date.as_deref().unwrap_or("undated")
            ));
            context_parts.push(result.excerpt.clone());
            context_parts.push(String::new());

            sources.push(Source {
                file: result.file_path.clone(),
                title: result.title.clone(),
                excerpt: excerpt_chars(&result.excerpt, 100),
            });
        }

        let context = context_parts.join("\n");

        let answer = match &self.llm {
            Some(client) => match client.complete(&build_prompt(question, &context)).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(error = %e, "answer LLM call failed, degrading to context dump");
                    format!("Error generating answer: {e}\n\nBased on search results, here are relevant excerpts:\n\n{context}")
                }
            },
            None => format!("No answer LLM configured.\n\nBased on search results, here are relevant excerpts:\n\n{context}"),
        };

        Ok((answer, sources))
    }

    /// Builds a summary of recent mentions of `person`: recent topics,
    /// apparent open action items, and the most recent meetings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying searches fail.
    pub async fn get_person_context(&self, person: &str) -> Result<PersonContext> {
        let direct = self
            .search(person, VaultScope::Work, None, Some(person), 20, SearchMode::Hybrid)
            .await?;
        let mentions = self
            .search(
                &format!("meeting with {person}"),
                VaultScope::Work,
                None,
                None,
                10,
                SearchMode::Hybrid,
            )
            .await?;

        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::new();
        for r in direct.into_iter().chain(mentions) {
            if seen.insert(r.file_path.clone()) {
                unique.push(r);
            }
        }

        let action_pattern = Regex::new(&format!(r"(?i){}[:\s]+(.+?)(?:\n|$)", regex::escape(person))).ok();

        let mut topics = Vec::new();
        let mut actions = Vec::new();
        let mut dates = Vec::new();

        for r in unique.iter().take(10) {
            if let Some(date) = &r.date {
                dates.push(date.clone());
            }
            if r.excerpt.to_lowercase().contains(&person.to_lowercase())
                && let Some(pattern) = &action_pattern
            {
                for capture in pattern.captures_iter(&r.excerpt).take(2) {
                    if let Some(m) = capture.get(1) {
                        actions.push(m.as_str().to_string());
                    }
                }
            }
            if !r.title.is_empty() && !topics.contains(&r.title) {
                topics.push(r.title.clone());
            }
        }

        let recent_meetings = unique
            .iter()
            .take(5)
            .map(|r| RecentMeeting {
                date: r.date.clone(),
                title: r.title.clone(),
                summary: excerpt_chars(&r.excerpt, 150),
            })
            .collect();

        dates.sort();

        Ok(PersonContext {
            person: person.to_string(),
            meeting_count: unique.len(),
            last_meeting: dates.last().cloned(),
            recent_topics: topics.into_iter().take(5).collect(),
            open_actions: actions.into_iter().take(5).collect(),
            recent_meetings,
        })
    }

    /// Extracts bulleted action-item lines from recent work-vault
    /// documents, optionally scoped to lines mentioning `person`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying search fails.
    pub async fn get_action_items(&self, person: Option<&str>, limit: usize) -> Result<Vec<ActionItem>> {
        let query = match person {
            Some(p) => format!("action items {p}"),
            None => "action items next steps".to_string(),
        };

        let results = self
            .search(&query, VaultScope::Work, None, None, 50, SearchMode::Hybrid)
            .await?;

        let keywords = ["will", "to do", "action", "next", "follow"];
        let mut items = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for r in &results {
            for raw_line in r.excerpt.lines() {
                let line = raw_line.trim();
                let is_bulleted = ["-", "\u{2022}", "*"].iter().any(|b| line.starts_with(b));
                if !is_bulleted || line.len() <= 10 {
                    continue;
                }

                let matches = match person {
                    Some(p) => line.to_lowercase().contains(&p.to_lowercase()),
                    None => keywords.iter().any(|k| line.to_lowercase().contains(k)),
                };
                if !matches {
                    continue;
                }

                let item = line.trim_start_matches(['-', '\u{2022}', '*', ' ']).to_string();
                if seen.insert(item.clone()) {
                    items.push(ActionItem {
                        item,
                        date: r.date.clone(),
                        source: r.title.clone(),
                    });
                }
            }
        }

        items.truncate(limit);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_scope_parses_case_insensitively() {
        assert_eq!(VaultScope::parse("WORK"), VaultScope::Work);
        assert_eq!(VaultScope::parse("personal"), VaultScope::Personal);
        assert_eq!(VaultScope::parse("anything else"), VaultScope::All);
    }

    #[test]
    fn search_mode_parses_with_hybrid_default() {
        assert_eq!(SearchMode::parse("vector"), SearchMode::Vector);
        assert_eq!(SearchMode::parse("bm25"), SearchMode::Bm25);
        assert_eq!(SearchMode::parse("query"), SearchMode::Query);
        assert_eq!(SearchMode::parse("unknown"), SearchMode::Hybrid);
    }

    #[test]
    fn excerpt_chars_truncates_with_ellipsis() {
        let long = "a".repeat(200);
        let result = excerpt_chars(&long, 100);
        assert_eq!(result.chars().count(), 103);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn excerpt_chars_is_noop_for_short_text() {
        assert_eq!(excerpt_chars("short", 100), "short");
    }
}
