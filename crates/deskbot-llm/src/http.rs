//! HTTP clients for OpenAI-compatible embedding and completion endpoints.
//!
//! Each call issues exactly one request. Failures propagate to the caller;
//! there is no local retry, backoff, or fallback answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deskbot_core::{
    ChatRole, ChatTurn, CompletionClient, DeskbotError, EmbeddingClient, EmbeddingConfig,
    GenerationConfig, Result,
};

fn api_key_from_env(var: &str, context: &'static str) -> Result<String> {
    std::env::var(var).map_err(|_| {
        DeskbotError::config(format!("{} environment variable not set ({})", var, context))
    })
}

// ============ Embeddings ============

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
    api_key: String,
}

impl HttpEmbedder {
    /// Create a client; fails when the API key variable is unset.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let api_key = api_key_from_env(&config.api_key_env, "embedding client")?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch = texts.len(), model = %self.config.model, "embedding batch");

        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskbotError::embedding(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeskbotError::embedding(format!(
                "endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DeskbotError::embedding(format!("invalid response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(DeskbotError::embedding(format!(
                "requested {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

// ============ Completions ============

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

/// Completion client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpCompleter {
    client: reqwest::Client,
    api_key: String,
}

impl HttpCompleter {
    /// Create a client; fails when the API key variable is unset.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = api_key_from_env(&config.api_key_env, "completion client")?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompleter {
    async fn complete(
        &self,
        system: &str,
        history: &[ChatTurn],
        user_turn: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
        for turn in history {
            messages.push(ChatMessage {
                role: role_str(turn.role),
                content: &turn.content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_turn,
        });

        debug!(model = %config.model, turns = messages.len(), "requesting completion");

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let body = CompletionRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskbotError::completion(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeskbotError::completion(format!(
                "endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DeskbotError::completion(format!("invalid response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DeskbotError::completion("response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_request_shape() {
        let texts = vec!["reset password".to_string()];
        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &texts,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"][0], "reset password");
    }

    #[test]
    fn test_embedding_response_parse() {
        let raw = r#"{"data": [{"embedding": [0.1, 0.2]}, {"embedding": [0.3, 0.4]}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].embedding, vec![0.3, 0.4]);
    }

    #[test]
    fn test_completion_response_parse() {
        let raw = r#"{"choices": [{"message": {"content": "Visit the portal."}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Visit the portal.");
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = EmbeddingConfig {
            api_key_env: "DESKBOT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(HttpEmbedder::new(config).is_err());
    }
}
