//! # Agentflow - Composable LLM Workflow Patterns
//!
//! Agentflow packages the common control-flow shapes for orchestrating calls
//! to an LLM completion service:
//! - Prompt chaining
//! - Content-based routing
//! - Parallel fan-out with bounded concurrency
//! - Orchestrator-workers task decomposition
//! - Evaluator-optimizer iterative refinement
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentflow_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AgentflowConfig::load()?;
//!     let invoker = config.invoker()?;
//!
//!     let refined = EvaluatorOptimizer::from_settings(invoker, &config.evaluator)?
//!         .run("Implement a stack with O(1) push, pop and getMin")
//!         .await?;
//!
//!     println!("{}", refined.final_solution);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `llm-openai`: OpenAI (and compatible) chat completions provider
//! - `llm-ollama`: Local Ollama provider
//!
//! Without either flag only [`llm::StubLLMProvider`] and custom
//! [`llm::LLMProvider`] implementations are available.

pub mod config;
pub mod error;
pub mod llm;
pub mod workflow;

pub use error::{AgentflowError, Result};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AgentflowConfig, LLMProviderConfig, ProviderKind};
    pub use crate::error::{AgentflowError, Result};
    pub use crate::llm::{
        InvocationSettings, LLMProvider, LLMProviderFactory, ModelInvoker, RetryConfig,
        StructuredOutput, StubLLMProvider,
    };
    pub use crate::workflow::{
        Chain, EvaluatorOptimizer, FinalResponse, Orchestrator, Parallel, RefinedResponse,
        RouteTable, Router,
    };
}
