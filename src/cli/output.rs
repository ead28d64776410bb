//! Output formatting for CLI commands: text and JSON renderings of search
//! results, status, and errors.

use crate::error::{BackendError, Error, StoreError};
use crate::indexer::IndexReport;
use crate::search::{ActionItem, PersonContext, SearchResult, Source};
use crate::storage::StoreStats;
use serde::Serialize;
use std::fmt::Write as _;

/// Output rendering requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// A single pretty-printed JSON value.
    Json,
    /// Newline-delimited JSON, one value per result.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name, defaulting to [`Self::Text`] for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" | "stream" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Whether this format streams one record per line.
    #[must_use]
    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::Ndjson)
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Renders store statistics.
#[must_use]
pub fn format_status(stats: &StoreStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str("noteseeker status\n");
            let _ = writeln!(out, "  work chunks:     {}", stats.work_chunks);
            let _ = writeln!(out, "  personal chunks: {}", stats.personal_chunks);
            let _ = writeln!(out, "  documents:       {}", stats.documents);
            let _ = writeln!(out, "  schema version:  {}", stats.schema_version);
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format_json(stats),
    }
}

/// Renders an indexing pass report.
#[must_use]
pub fn format_index_report(report: &IndexReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "indexed {} of {} files seen ({} skipped, {} chunks written)",
                report.files_indexed, report.files_seen, report.files_skipped, report.chunks_written
            );
            if report.cancelled {
                out.push_str("indexing was cancelled before completion\n");
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format_json(report),
    }
}

/// Renders a list of search results for a given query.
#[must_use]
pub fn format_search_results(results: &[SearchResult], query: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if results.is_empty() {
                return format!("no results for \"{query}\"\n");
            }
            let mut out = String::new();
            let _ = writeln!(out, "{} result(s) for \"{query}\":\n", results.len());
            for (i, r) in results.iter().enumerate() {
                let _ = writeln!(out, "{}. [{:.4}] {} ({})", i + 1, r.score, r.title, r.vault.as_str());
                let _ = writeln!(out, "   {}", r.file_path);
                if let Some(date) = &r.date {
                    let _ = writeln!(out, "   date: {date}");
                }
                let _ = writeln!(out, "   {}", r.excerpt.replace('\n', " "));
                out.push('\n');
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format_json(&results),
    }
}

/// Renders an answer from [`crate::search::Searcher::query_with_llm`]
/// alongside the sources it was drawn from.
#[must_use]
pub fn format_ask(answer: &str, sources: &[Source], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(answer.trim());
            out.push('\n');
            if !sources.is_empty() {
                out.push_str("\nsources:\n");
                for s in sources {
                    let _ = writeln!(out, "  - {} ({})", s.title, s.file);
                }
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            #[derive(Serialize)]
            struct AskOutput<'a> {
                answer: &'a str,
                sources: &'a [Source],
            }
            format_json(&AskOutput { answer, sources })
        }
    }
}

/// Renders the summarized context for a person.
#[must_use]
pub fn format_person_context(context: &PersonContext, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "{}", context.person);
            let _ = writeln!(out, "  mentioned in {} document(s)", context.meeting_count);
            if let Some(last) = &context.last_meeting {
                let _ = writeln!(out, "  last meeting: {last}");
            }
            if !context.recent_topics.is_empty() {
                out.push_str("  recent topics:\n");
                for t in &context.recent_topics {
                    let _ = writeln!(out, "    - {t}");
                }
            }
            if !context.open_actions.is_empty() {
                out.push_str("  open actions:\n");
                for a in &context.open_actions {
                    let _ = writeln!(out, "    - {a}");
                }
            }
            if !context.recent_meetings.is_empty() {
                out.push_str("  recent meetings:\n");
                for m in &context.recent_meetings {
                    let _ = writeln!(
                        out,
                        "    - {} ({}): {}",
                        m.title,
                        m.date.as_deref().unwrap_or("undated"),
                        m.summary
                    );
                }
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format_json(context),
    }
}

/// Renders a list of action items.
#[must_use]
pub fn format_action_items(items: &[ActionItem], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                return "no action items found\n".to_string();
            }
            let mut out = String::new();
            for item in items {
                let _ = writeln!(
                    out,
                    "- {} ({}, {})",
                    item.item,
                    item.source,
                    item.date.as_deref().unwrap_or("undated")
                );
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format_json(&items),
    }
}

/// Renders an error for display, with structured detail in JSON formats.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let (error_type, suggestion) = error_details(error);
            let json = serde_json::json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": error.to_string(),
                    "suggestion": suggestion,
                }
            });
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

fn error_details(error: &Error) -> (&'static str, Option<&'static str>) {
    match error {
        Error::TransientBackend(e) => match e {
            BackendError::Request(_) => (
                "backend_request_failed",
                Some("check that the embedding, reranking, and answer-llm backends are reachable"),
            ),
            BackendError::Status { .. } => ("backend_status_error", None),
            BackendError::Decode(_) => ("backend_decode_error", None),
        },
        Error::MalformedInput(_) => ("malformed_input", None),
        Error::Config(_) => (
            "config_error",
            Some("check VAULT_WORK_PATH/VAULT_PERSONAL_PATH and your config file"),
        ),
        Error::Store(e) => match e {
            StoreError::Database(_) => ("database_error", None),
            StoreError::UnknownTable(_) => ("unknown_table", None),
            StoreError::Serialization(_) => ("serialization_error", None),
        },
        Error::Cancelled => ("cancelled", None),
        Error::Io(_) => ("io_error", None),
    }
}
