//! Model Invocation Service
//!
//! [`ModelInvoker`] is the single capability every workflow depends on. It is a
//! cheap, cloneable handle so concurrent units can each own one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentflowError, Result};

use super::retry::{RetryConfig, with_retry};
use super::structured::{StructuredOutput, decode_structured};
use super::{LLMProvider, LLMRequest, ModelInfo};

/// Per-call policy applied by [`ModelInvoker`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationSettings {
    /// Upper bound on a single provider call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Sampling temperature forwarded to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Completion token limit forwarded to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Retry policy for transient provider failures
    pub retry: RetryConfig,
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            temperature: None,
            max_tokens: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Free-text and structured completion on top of an [`LLMProvider`]
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn LLMProvider>,
    settings: Arc<InvocationSettings>,
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("model", &self.provider.model_info())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ModelInvoker {
    /// Wrap a provider with default invocation settings
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self::with_settings(provider, InvocationSettings::default())
    }

    pub fn with_settings(provider: Arc<dyn LLMProvider>, settings: InvocationSettings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &InvocationSettings {
        &self.settings
    }

    pub fn model_info(&self) -> ModelInfo {
        self.provider.model_info()
    }

    /// Free-text completion.
    ///
    /// Each attempt is bounded by the configured timeout; transient failures
    /// are retried per the retry policy.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = LLMRequest::from_prompt(prompt)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        with_retry(&self.settings.retry, || self.attempt(&request)).await
    }

    /// Structured completion decoded into `T`.
    ///
    /// The provider call is retried like [`complete`](Self::complete); a reply
    /// that cannot be decoded fails immediately with `MalformedOutput`.
    pub async fn complete_structured<T: StructuredOutput>(&self, prompt: &str) -> Result<T> {
        let prompt = format!("{prompt}\n\n{}", T::format_instructions());
        let raw = self.complete(&prompt).await?;

        decode_structured::<T>(&raw).inspect_err(|err| {
            tracing::warn!(target_type = T::NAME, error = %err, "Structured output rejected");
        })
    }

    async fn attempt(&self, request: &LLMRequest) -> Result<String> {
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, self.provider.generate_request(request)).await {
            Ok(response) => {
                let response = response?;
                if let Some(usage) = response.usage {
                    tracing::debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Model call completed"
                    );
                }
                Ok(response.content)
            }
            Err(_) => Err(AgentflowError::invocation(
                self.provider.model_info().provider,
                format!("timed out after {timeout:?}"),
            )),
        }
    }
}
