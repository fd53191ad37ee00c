//! Model invocation layer
//!
//! [`LLMProvider`] is the seam to an actual completion backend. Workflows never
//! talk to a provider directly; they go through [`ModelInvoker`], which adds
//! per-call timeouts, bounded retry for transient failures and structured
//! output decoding on top of any provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod factory;
pub mod invoker;
pub mod providers;
pub mod retry;
pub mod structured;
pub mod stub;

pub use factory::LLMProviderFactory;
pub use invoker::{InvocationSettings, ModelInvoker};
pub use retry::{RetryConfig, with_retry};
pub use structured::{StructuredOutput, decode_structured};
pub use stub::StubLLMProvider;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire name used by chat-completion style APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Request to an LLM provider
#[derive(Debug, Clone)]
pub struct LLMRequest {
    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// Temperature for generation (0.0-2.0)
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<usize>,
}

impl LLMRequest {
    /// Create a simple request from a single user prompt
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message {
                role: MessageRole::User,
                content: prompt.into(),
            }],
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature, clamped to 0.0-2.0
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature.map(|t| t.clamp(0.0, 2.0));
        self
    }

    /// Set the completion token limit
    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Concatenated text of the user messages
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Generated content
    pub content: String,

    /// Token usage information
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub provider: String,
    pub model_name: String,
}

/// Trait for LLM provider implementations.
///
/// Implementors perform exactly one completion per call and report
/// transport or API failures as [`crate::AgentflowError::ModelInvocation`].
/// Retry and timeout policy live in [`ModelInvoker`], not here.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for the request
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse>;

    /// Generate text for a single user prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.generate_request(&LLMRequest::from_prompt(prompt)).await?;
        Ok(response.content)
    }

    /// Get model information
    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "unknown".to_string(),
            model_name: "unknown".to_string(),
        }
    }
}
