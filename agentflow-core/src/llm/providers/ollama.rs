//! Ollama provider (local models over `/api/chat`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentflowError, Result};
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, ModelInfo, TokenUsage};

use super::http_error;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen3:14b";
const PROVIDER: &str = "ollama";

/// Ollama LLM provider
pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// `base_url` defaults to `http://localhost:11434`.
    pub fn new(model: impl Into<String>, base_url: Option<impl Into<String>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: base_url
                .map(|u| u.into())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Create from environment variables.
    ///
    /// Reads from:
    /// - `OLLAMA_MODEL` - Model name (optional, defaults to "qwen3:14b")
    /// - `OLLAMA_BASE_URL` - Base URL (optional)
    pub fn from_env(model: Option<impl Into<String>>) -> Result<Self> {
        let model = model
            .map(|m| m.into())
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(model, Some(base_url)))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
    #[serde(default)]
    thinking: Option<String>,
}

impl ChatResponse {
    /// Reasoning models sometimes leave `content` empty and answer in `thinking`
    fn into_content(self) -> String {
        let content = self.message.content.trim();
        if content.is_empty() {
            self.message
                .thinking
                .map(|t| t.trim().to_string())
                .unwrap_or_default()
        } else {
            content.to_string()
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        let body = ChatRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AgentflowError::invocation(
                    PROVIDER,
                    format!("failed to send request: {e}. Make sure Ollama is running."),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(http_error(PROVIDER, status, text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AgentflowError::invocation(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(prompt_tokens), Some(completion_tokens)) => Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            _ => None,
        };

        Ok(LLMResponse {
            content: parsed.into_content(),
            usage,
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: PROVIDER.to_string(),
            model_name: self.model.clone(),
        }
    }
}
