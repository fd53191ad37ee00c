//! HTTP-backed LLM providers
//!
//! Both providers perform a single non-streaming chat completion per call and
//! report failures as [`crate::AgentflowError::ModelInvocation`] carrying the
//! HTTP status when there is one.

#[cfg(feature = "llm-ollama")]
pub mod ollama;

#[cfg(feature = "llm-ollama")]
pub use ollama::OllamaProvider;

#[cfg(feature = "llm-openai")]
pub mod openai;

#[cfg(feature = "llm-openai")]
pub use openai::OpenAIProvider;

#[cfg(any(feature = "llm-openai", feature = "llm-ollama"))]
use crate::error::AgentflowError;

/// Map a non-success HTTP reply to a provider error
#[cfg(any(feature = "llm-openai", feature = "llm-ollama"))]
pub(crate) fn http_error(
    provider: &str,
    status: reqwest::StatusCode,
    message: String,
) -> AgentflowError {
    AgentflowError::ModelInvocation {
        provider: provider.to_string(),
        status: Some(status.as_u16()),
        message,
    }
}
