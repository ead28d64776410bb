//! HTTP embedding client for an Ollama-style `/api/embed` backend.

use crate::embedding::{Embedder, MAX_INPUT_CHARS, truncate_for_embedding};
use crate::error::{BackendError, Error, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CACHE_CAPACITY: usize = 10_000;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Calls an Ollama-style embedding backend and caches results by content
/// hash in a bounded LRU so a long-running process does not grow it
/// without limit.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
    cache: Mutex<LruCache<u64, Vec<f32>>>,
}

impl OllamaEmbedder {
    /// Creates a new client targeting `base_url` with the given model and
    /// expected output dimension.
    ///
    /// # Panics
    ///
    /// Never panics: [`CACHE_CAPACITY`] is a nonzero compile-time constant.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        #[allow(clippy::expect_used)]
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).expect("CACHE_CAPACITY is nonzero");
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cache_key(text: &str) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let truncated = truncate_for_embedding(text);
        debug_assert!(truncated.chars().count() <= MAX_INPUT_CHARS);
        let key = Self::cache_key(truncated);

        if let Some(cached) = self
            .cache
            .lock()
            .map_or(None, |mut cache| cache.get(&key).cloned())
        {
            return Ok(cached);
        }

        let url = format!("{}/api/embed", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&EmbedRequest {
                model: &self.model,
                input: truncated,
            })
            .send()
            .await
            .map_err(BackendError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "embedding backend returned error status");
            return Err(Error::TransientBackend(BackendError::Status {
                status,
                body: body.chars().take(500).collect(),
            }));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let embedding = parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("empty embeddings array".to_string()))?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, embedding.clone());
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embeds_via_api_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2, 0.3]]
            })))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(server.uri(), "nomic-embed-text", 3);
        let result = embedder.embed("hello").await;
        assert_eq!(result.unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn caches_repeat_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(server.uri(), "nomic-embed-text", 2);
        let first = embedder.embed("repeat me").await.unwrap();
        let second = embedder.embed("repeat me").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn surfaces_non_success_status_as_transient_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(server.uri(), "m", 2);
        let result = embedder.embed("x").await;
        assert!(matches!(result, Err(Error::TransientBackend(_))));
    }
}
