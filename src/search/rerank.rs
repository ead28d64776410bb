//! LLM-based reranking and query expansion, backed by an Ollama-style
//! `/api/generate` endpoint.

use crate::error::{BackendError, Result};
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

const RERANK_PROMPT: &str = "You are a relevance judge. Given a query and a document, determine if the document is relevant.\n\nQuery: {query}\n\nDocument:\n{document}\n\nIs this document relevant to the query? Answer with only YES or NO.";

const QUERY_EXPANSION_PROMPT: &str = "Generate 2 alternative search queries for: \"{query}\"\n\nRules:\n- Keep the same meaning/intent\n- Use different words or phrasings\n- One should be more specific, one more general\n- Keep each under 10 words\n\nOutput exactly 2 lines, one query per line:";

const DOCUMENT_TRUNCATE_CHARS: usize = 2_000;

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Calls an Ollama-style `/api/generate` backend to score document
/// relevance and propose alternative query phrasings.
pub struct RerankerClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl RerankerClient {
    /// Creates a new client targeting `base_url` with the given model.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: Duration::from_secs(10),
        }
    }

    async fn generate(&self, prompt: &str, temperature: f64, num_predict: u32) -> Option<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": num_predict,
            }
        });

        let response = match self.client.post(&url).timeout(self.timeout).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "reranker generate request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), "reranker generate returned error status");
            return None;
        }

        match response.json::<GenerateResponse>().await {
            Ok(parsed) => Some(parsed.response.trim().to_string()),
            Err(e) => {
                error!(error = %e, "reranker generate response was not the expected shape");
                None
            }
        }
    }

    /// Scores a single document's relevance to `query`: `1.0` relevant,
    /// `0.0` not relevant, `0.5` for an ambiguous or failed response.
    pub async fn score_document(&self, query: &str, document: &str) -> f64 {
        let truncated: String = document.chars().take(DOCUMENT_TRUNCATE_CHARS).collect();
        let prompt = RERANK_PROMPT
            .replace("{query}", query)
            .replace("{document}", &truncated);

        let Some(response) = self.generate(&prompt, 0.0, 10).await else {
            return 0.5;
        };

        let upper = response.to_uppercase();
        if upper.starts_with("YES") {
            1.0
        } else if upper.starts_with("NO") {
            0.0
        } else {
            debug!(response, "ambiguous rerank response");
            0.5
        }
    }

    /// Scores the top `top_k` of `documents` against `query`, at most
    /// `concurrency` requests in flight at once. Returns a map from
    /// `file_path` to relevance score.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[(String, String)],
        top_k: usize,
        concurrency: usize,
    ) -> HashMap<String, f64> {
        let candidates = &documents[..documents.len().min(top_k)];

        let scored: Vec<(String, f64)> = stream::iter(candidates.iter().cloned())
            .map(|(id, content)| async move {
                let score = self.score_document(query, &content).await;
                (id, score)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        scored.into_iter().collect()
    }

    /// Generates up to two alternative phrasings of `query`, returning
    /// `[query, alt1, alt2]` (fewer entries if expansion fails or the
    /// backend returns fewer usable lines).
    pub async fn expand_query(&self, query: &str) -> Vec<String> {
        let prompt = QUERY_EXPANSION_PROMPT.replace("{query}", query);
        let Some(response) = self.generate(&prompt, 0.7, 50).await else {
            return vec![query.to_string()];
        };

        let mut alternatives = Vec::new();
        for raw_line in response.lines().take(2) {
            let mut line = raw_line.trim();
            for prefix in ["1.", "2.", "1:", "2:", "1)", "2)", "-", "\u{2022}"] {
                if let Some(rest) = line.strip_prefix(prefix) {
                    line = rest.trim();
                }
            }
            if !line.is_empty() && line != query {
                alternatives.push(line.to_string());
            }
        }

        let mut queries = vec![query.to_string()];
        queries.extend(alternatives);
        queries
    }

    /// Checks whether the configured model is available on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error only for request failures; an unavailable model
    /// is reported as `Ok(false)`, not an error.
    pub async fn check_model(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(BackendError::from)?;

        if !response.status().is_success() {
            return Ok(false);
        }

        #[derive(Deserialize)]
        struct Tags {
            #[serde(default)]
            models: Vec<ModelEntry>,
        }
        #[derive(Deserialize)]
        struct ModelEntry {
            #[serde(default)]
            name: String,
        }

        let tags: Tags = response.json().await.map_err(|e| BackendError::Decode(e.to_string()))?;
        let target = self.model.split(':').next().unwrap_or(&self.model);
        Ok(tags
            .models
            .iter()
            .any(|m| m.name.split(':').next().unwrap_or(&m.name) == target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn score_document_parses_yes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "YES"})))
            .mount(&server)
            .await;

        let client = RerankerClient::new(server.uri(), "qwen2.5:0.5b");
        assert_eq!(client.score_document("q", "doc").await, 1.0);
    }

    #[tokio::test]
    async fn score_document_parses_no() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "NO"})))
            .mount(&server)
            .await;

        let client = RerankerClient::new(server.uri(), "qwen2.5:0.5b");
        assert_eq!(client.score_document("q", "doc").await, 0.0);
    }

    #[tokio::test]
    async fn score_document_degrades_to_half_on_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RerankerClient::new(server.uri(), "qwen2.5:0.5b");
        assert_eq!(client.score_document("q", "doc").await, 0.5);
    }

    #[tokio::test]
    async fn expand_query_falls_back_to_original_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RerankerClient::new(server.uri(), "qwen2.5:0.5b");
        assert_eq!(client.expand_query("my query").await, vec!["my query".to_string()]);
    }

    #[tokio::test]
    async fn rerank_scores_each_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "YES"})))
            .mount(&server)
            .await;

        let client = RerankerClient::new(server.uri(), "qwen2.5:0.5b");
        let docs = vec![
            ("a".to_string(), "content a".to_string()),
            ("b".to_string(), "content b".to_string()),
        ];
        let scores = client.rerank("q", &docs, 30, 5).await;
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("a"), Some(&1.0));
    }
}
