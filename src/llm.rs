//! Answer-synthesis LLM gateway client: an OpenAI-compatible
//! `/v1/chat/completions` endpoint, used to turn retrieved context into a
//! natural-language answer.

use crate::error::{BackendError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat completion gateway.
pub struct AnswerLlmClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AnswerLlmClient {
    /// Creates a new client targeting `base_url`, with an optional bearer token.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    /// Sends `prompt` as a single user message and returns the assistant's
    /// reply text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TransientBackend`] if the gateway is
    /// unreachable, returns a non-success status, or responds with no
    /// choices.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: "clawdbot",
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let mut request = self.client.post(&url).timeout(REQUEST_TIMEOUT).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(BackendError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(crate::error::Error::TransientBackend(BackendError::Status {
                status,
                body: body.chars().take(500).collect(),
            }));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| BackendError::Decode(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                crate::error::Error::TransientBackend(BackendError::Decode(
                    "no choices in chat completion response".to_string(),
                ))
            })
    }
}

/// Builds the retrieval-augmented prompt sent to the answer LLM, from a
/// question and the numbered context excerpts retrieved for it.
#[must_use]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following context from my notes, please answer this question:\n\n\
         Question: {question}\n\n\
         Context:\n{context}\n\n\
         Please provide a concise, helpful answer based only on the information provided. \
         If the context doesn't contain enough information to fully answer the question, say so."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_returns_assistant_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "the answer"}}]
            })))
            .mount(&server)
            .await;

        let client = AnswerLlmClient::new(server.uri(), Some("tok".to_string()));
        let answer = client.complete("what happened?").await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn complete_surfaces_backend_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AnswerLlmClient::new(server.uri(), None);
        let result = client.complete("q").await;
        assert!(result.is_err());
    }

    #[test]
    fn build_prompt_includes_question_and_context() {
        let prompt = build_prompt("who owns the migration?", "[Source 1] ...");
        assert!(prompt.contains("who owns the migration?"));
        assert!(prompt.contains("[Source 1]"));
    }
}
