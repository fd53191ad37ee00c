//! Factory for creating LLM providers from configuration

use std::sync::Arc;

use crate::config::{LLMProviderConfig, ProviderKind};
#[cfg(not(all(feature = "llm-openai", feature = "llm-ollama")))]
use crate::error::AgentflowError;
use crate::error::Result;
use crate::llm::LLMProvider;

#[cfg(feature = "llm-ollama")]
use crate::llm::providers::ollama::OllamaProvider;

#[cfg(feature = "llm-openai")]
use crate::llm::providers::openai::OpenAIProvider;

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    ///
    /// An empty `model` falls back to the provider's own environment variable
    /// and then its built-in default.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing API key
    /// or the provider's feature is not compiled in)
    pub fn create(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>> {
        let model = (!config.model.trim().is_empty()).then(|| config.model.clone());

        let provider = match config.provider {
            ProviderKind::OpenAI => Self::openai(config, model)?,
            ProviderKind::Ollama => Self::ollama(config, model)?,
        };

        let info = provider.model_info();
        tracing::info!(provider = %info.provider, model = %info.model_name, "LLM provider created");
        Ok(provider)
    }

    #[cfg(feature = "llm-openai")]
    fn openai(config: &LLMProviderConfig, model: Option<String>) -> Result<Arc<dyn LLMProvider>> {
        let provider = match &config.api_key {
            Some(api_key) => {
                let model = model
                    .or_else(|| std::env::var("OPENAI_MODEL").ok())
                    .unwrap_or_else(|| "gpt-4o".to_string());
                match &config.base_url {
                    Some(base_url) => {
                        OpenAIProvider::with_base_url(api_key.clone(), model, base_url.clone())
                    }
                    None => OpenAIProvider::new(api_key.clone(), model),
                }
            }
            None => OpenAIProvider::from_env(model)?,
        };
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "llm-openai"))]
    fn openai(_config: &LLMProviderConfig, _model: Option<String>) -> Result<Arc<dyn LLMProvider>> {
        Err(AgentflowError::Configuration(
            "OpenAI provider requires 'llm-openai' feature".to_string(),
        ))
    }

    #[cfg(feature = "llm-ollama")]
    fn ollama(config: &LLMProviderConfig, model: Option<String>) -> Result<Arc<dyn LLMProvider>> {
        let provider = match &config.base_url {
            Some(url) => OllamaProvider::new(
                model
                    .or_else(|| std::env::var("OLLAMA_MODEL").ok())
                    .unwrap_or_else(|| "qwen3:14b".to_string()),
                Some(url.clone()),
            ),
            None => OllamaProvider::from_env(model)?,
        };
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "llm-ollama"))]
    fn ollama(_config: &LLMProviderConfig, _model: Option<String>) -> Result<Arc<dyn LLMProvider>> {
        Err(AgentflowError::Configuration(
            "Ollama provider requires 'llm-ollama' feature".to_string(),
        ))
    }
}
