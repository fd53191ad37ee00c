//! Configuration types for agentflow
//!
//! Every section and field has a default, so an empty configuration is valid
//! and any single field can be overridden from a file or the environment.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{AgentflowError, Result};
use crate::llm::{InvocationSettings, LLMProviderFactory, ModelInvoker};
use crate::workflow::prompts;

/// Environment variable naming an extra configuration file
pub const CONFIG_PATH_ENV: &str = "AGENTFLOW_CONFIG_PATH";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentflowConfig {
    /// LLM provider configuration (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LLMProviderConfig>,

    /// Timeout, sampling and retry policy for every model call
    pub invocation: InvocationSettings,

    pub chain: ChainSettings,
    pub routing: RoutingSettings,
    pub parallel: ParallelSettings,
    pub orchestrator: OrchestratorSettings,
    pub evaluator: EvaluatorSettings,
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type
    pub provider: ProviderKind,

    /// Model name; empty means the provider's env var or built-in default
    #[serde(default)]
    pub model: String,

    /// API key (prefer provider env vars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for custom endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl LLMProviderConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: String::new(),
            api_key: None,
            base_url: None,
        }
    }
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = AgentflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(AgentflowError::Configuration(format!(
                "Invalid LLM provider: {other}"
            ))),
        }
    }
}

/// Chain workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Step prompts applied in order
    pub steps: Vec<String>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            steps: prompts::default_chain_steps(),
        }
    }
}

/// Routing workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Classifier template with `{routes}` and `{input}` placeholders
    pub selector_prompt: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            selector_prompt: prompts::ROUTE_SELECTOR.to_string(),
        }
    }
}

/// Parallelization workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelSettings {
    /// Maximum simultaneously active units
    pub concurrency: usize,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Orchestrator/worker workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub orchestrator_prompt: String,
    pub worker_prompt: String,
    /// Workers run at once; 1 keeps plan order sequential
    pub worker_concurrency: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            orchestrator_prompt: prompts::ORCHESTRATOR.to_string(),
            worker_prompt: prompts::WORKER.to_string(),
            worker_concurrency: 1,
        }
    }
}

/// Evaluator/optimizer workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    pub generator_prompt: String,
    pub evaluator_prompt: String,
    /// Generate/evaluate rounds before giving up
    pub max_iterations: usize,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            generator_prompt: prompts::GENERATOR.to_string(),
            evaluator_prompt: prompts::EVALUATOR.to_string(),
            max_iterations: 10,
        }
    }
}

impl AgentflowConfig {
    /// Layered configuration sources.
    ///
    /// Merged in this order, later sources winning:
    /// 1. Built-in defaults
    /// 2. `agentflow.toml` and `agentflow.yaml` in the working directory
    /// 3. The file named by `AGENTFLOW_CONFIG_PATH`
    /// 4. `AGENTFLOW_` environment variables, nested with `__`
    ///    (e.g. `AGENTFLOW_PARALLEL__CONCURRENCY=8`)
    pub fn figment() -> Figment {
        Self::figment_with(None)
    }

    /// Like [`figment`](Self::figment), with an explicit file taking the place
    /// of `AGENTFLOW_CONFIG_PATH`
    pub fn figment_with(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AgentflowConfig::default()))
            .merge(Toml::file("agentflow.toml"))
            .merge(Yaml::file("agentflow.yaml"));

        match file {
            Some(path) => figment = merge_file(figment, path),
            None => {
                if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
                    figment = merge_file(figment, Path::new(&path));
                }
            }
        }

        figment.merge(Env::prefixed("AGENTFLOW_").split("__"))
    }

    /// Load configuration from files and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value is out of range.
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment())
    }

    /// Load with `path` as the explicit configuration file; environment
    /// variables still override it.
    pub fn load_with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        Self::extract(Self::figment_with(Some(path)))
    }

    /// Load configuration from a specific file on top of the defaults.
    ///
    /// The format is chosen by extension: `.yaml`/`.yml` or TOML otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let figment = Figment::from(Serialized::defaults(AgentflowConfig::default()));
        Self::extract(merge_file(figment, path))
    }

    /// Extract and validate from an arbitrary figment
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: AgentflowConfig = figment.extract().map_err(|e| {
            AgentflowError::Configuration(format!("Failed to load configuration: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Build the model invoker described by the `llm` and `invocation` sections
    pub fn invoker(&self) -> Result<ModelInvoker> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            AgentflowError::Configuration(
                "No LLM provider configured (set llm.provider or AGENTFLOW_LLM__PROVIDER)"
                    .to_string(),
            )
        })?;

        let provider = LLMProviderFactory::create(llm)?;
        Ok(ModelInvoker::with_settings(provider, self.invocation.clone()))
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("parallel.concurrency", self.parallel.concurrency),
            (
                "orchestrator.worker_concurrency",
                self.orchestrator.worker_concurrency,
            ),
            ("evaluator.max_iterations", self.evaluator.max_iterations),
            (
                "invocation.retry.max_attempts",
                self.invocation.retry.max_attempts,
            ),
        ];

        for (key, value) in positive {
            if value == 0 {
                return Err(AgentflowError::Configuration(format!(
                    "{key} must be greater than 0"
                )));
            }
        }

        if self.invocation.timeout.is_zero() {
            return Err(AgentflowError::Configuration(
                "invocation.timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(AgentflowError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = AgentflowConfig::default();
        assert!(config.llm.is_none());
        assert_eq!(config.parallel.concurrency, 4);
        assert_eq!(config.orchestrator.worker_concurrency, 1);
        assert_eq!(config.evaluator.max_iterations, 10);
        assert_eq!(config.chain.steps.len(), 4);
        assert_eq!(config.invocation.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_load_without_sources_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = AgentflowConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config, AgentflowConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_overrides_single_fields() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "agentflow.toml",
                r#"
                [llm]
                provider = "ollama"
                model = "llama3"

                [evaluator]
                max_iterations = 3

                [invocation]
                timeout = "15s"

                [invocation.retry]
                max_attempts = 5
                "#,
            )?;

            let config = AgentflowConfig::load().map_err(|e| e.to_string())?;
            let llm = config.llm.clone().expect("llm section");
            assert_eq!(llm.provider, ProviderKind::Ollama);
            assert_eq!(llm.model, "llama3");
            assert_eq!(config.evaluator.max_iterations, 3);
            assert_eq!(config.invocation.timeout, Duration::from_secs(15));
            assert_eq!(config.invocation.retry.max_attempts, 5);
            // untouched fields keep their defaults
            assert_eq!(config.evaluator.generator_prompt, prompts::GENERATOR);
            assert_eq!(config.invocation.retry.backoff_multiplier, 2.0);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("agentflow.toml", "[parallel]\nconcurrency = 2\n")?;
            jail.set_env("AGENTFLOW_PARALLEL__CONCURRENCY", "8");
            jail.set_env("AGENTFLOW_ORCHESTRATOR__WORKER_CONCURRENCY", "3");

            let config = AgentflowConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.parallel.concurrency, 8);
            assert_eq!(config.orchestrator.worker_concurrency, 3);
            Ok(())
        });
    }

    #[test]
    fn test_config_path_env_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.yaml",
                "routing:\n  selector_prompt: \"Pick one of {routes} for {input}\"\n",
            )?;
            jail.set_env(CONFIG_PATH_ENV, "custom.yaml");

            let config = AgentflowConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(
                config.routing.selector_prompt,
                "Pick one of {routes} for {input}"
            );
            Ok(())
        });
    }

    #[test]
    fn test_zero_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("AGENTFLOW_EVALUATOR__MAX_ITERATIONS", "0");
            let err = AgentflowConfig::load().unwrap_err();
            assert!(err.to_string().contains("evaluator.max_iterations"));
            Ok(())
        });
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[chain]\nsteps = [\"one\", \"two\"]").unwrap();

        let config = AgentflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chain.steps, vec!["one", "two"]);
        assert_eq!(config.parallel.concurrency, 4);

        assert!(matches!(
            AgentflowConfig::from_file("/nonexistent/agentflow.toml"),
            Err(AgentflowError::Configuration(_))
        ));
    }

    #[test]
    fn test_explicit_file_still_overridden_by_env() {
        Jail::expect_with(|jail| {
            jail.create_file("team.yaml", "parallel:\n  concurrency: 6\nevaluator:\n  max_iterations: 2\n")?;
            jail.set_env("AGENTFLOW_EVALUATOR__MAX_ITERATIONS", "5");

            let config = AgentflowConfig::load_with_file("team.yaml").map_err(|e| e.to_string())?;
            assert_eq!(config.parallel.concurrency, 6);
            assert_eq!(config.evaluator.max_iterations, 5);

            assert!(AgentflowConfig::load_with_file("missing.toml").is_err());
            Ok(())
        });
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("groq".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_invoker_requires_provider() {
        let config = AgentflowConfig::default();
        assert!(matches!(
            config.invoker(),
            Err(AgentflowError::Configuration(_))
        ));
    }
}
