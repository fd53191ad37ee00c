//! Workflow Patterns for LLM Agent Execution
//!
//! Five control-flow shapes over a [`ModelInvoker`](crate::llm::ModelInvoker):
//!
//! - **Chain**: Sequential steps where each output feeds the next input
//! - **Router**: Classifies the input, then answers with the selected route's prompt
//! - **Parallel**: Applies one template to many inputs with bounded concurrency
//! - **Orchestrator**: Plans subtasks and answers each with a worker call
//! - **Evaluator-Optimizer**: Regenerates until an evaluator passes the result
//!
//! Engines never call each other; the orchestrator reuses the parallel
//! fan-out for its workers. No state survives a single invocation.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentflow_core::workflow::{Chain, Router, RouteTable};
//!
//! let chain = Chain::builder(invoker.clone())
//!     .step("Summarize the text.")
//!     .step("Translate the summary to French.")
//!     .build();
//! let summary = chain.run(report).await?;
//!
//! let routes = RouteTable::from([
//!     ("billing".to_string(), "You are a billing specialist.".to_string()),
//!     ("technical".to_string(), "You are a support engineer.".to_string()),
//! ]);
//! let answer = Router::new(invoker).route(ticket, &routes).await?;
//! ```

mod chain;
mod evaluator_optimizer;
mod execution;
mod orchestrator;
mod parallel;
pub mod prompts;
mod routing;

pub use chain::{Chain, ChainBuilder};
pub use evaluator_optimizer::{
    Evaluation, EvaluationResponse, EvaluatorOptimizer, EvaluatorOptimizerBuilder, Generation,
    RefinedResponse,
};
pub use execution::{ExecutionTrace, StepTrace};
pub use orchestrator::{FinalResponse, Orchestrator, OrchestratorBuilder, OrchestratorResponse, SubTask};
pub use parallel::Parallel;
pub use routing::{RouteSelection, RouteTable, RoutedResponse, Router};
