//! Evaluator-Optimizer Pattern
//!
//! Iterative refinement: a generator proposes a solution, an evaluator grades
//! it, and rejected attempts plus the latest feedback are fed back into the
//! next generation. The loop ends on the first `PASS` or after
//! `max_iterations` rounds.

use serde::{Deserialize, Serialize};

use crate::config::EvaluatorSettings;
use crate::error::{AgentflowError, Result};
use crate::llm::{ModelInvoker, StructuredOutput};

/// One generator attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub thoughts: String,
    pub response: String,
}

impl StructuredOutput for Generation {
    const NAME: &'static str = "Generation";

    fn schema() -> serde_json::Value {
        serde_json::json!({ "thoughts": "string", "response": "string" })
    }
}

/// Evaluator verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Evaluation {
    Pass,
    NeedsImprovement,
    Fail,
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Evaluation::Pass => "PASS",
            Evaluation::NeedsImprovement => "NEEDS_IMPROVEMENT",
            Evaluation::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub evaluation: Evaluation,
    pub feedback: String,
}

impl StructuredOutput for EvaluationResponse {
    const NAME: &'static str = "EvaluationResponse";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "evaluation": "PASS | NEEDS_IMPROVEMENT | FAIL",
            "feedback": "string"
        })
    }
}

/// Accepted solution with every attempt that led to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedResponse {
    pub final_solution: String,
    pub chain_of_thought: Vec<Generation>,
}

/// Generate/evaluate refinement loop
#[derive(Clone)]
pub struct EvaluatorOptimizer {
    invoker: ModelInvoker,
    generator_prompt: String,
    evaluator_prompt: String,
    max_iterations: usize,
}

impl std::fmt::Debug for EvaluatorOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorOptimizer")
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl EvaluatorOptimizer {
    pub fn new(invoker: ModelInvoker) -> Self {
        let defaults = EvaluatorSettings::default();
        Self {
            invoker,
            generator_prompt: defaults.generator_prompt,
            evaluator_prompt: defaults.evaluator_prompt,
            max_iterations: defaults.max_iterations,
        }
    }

    pub fn from_settings(invoker: ModelInvoker, settings: &EvaluatorSettings) -> Result<Self> {
        Self::builder(invoker)
            .generator_prompt(settings.generator_prompt.clone())
            .evaluator_prompt(settings.evaluator_prompt.clone())
            .max_iterations(settings.max_iterations)
            .build()
    }

    pub fn builder(invoker: ModelInvoker) -> EvaluatorOptimizerBuilder {
        EvaluatorOptimizerBuilder {
            inner: Self::new(invoker),
        }
    }

    /// Refine a solution for `task` until the evaluator passes it.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank task
    /// - `MaxIterationsExceeded` carrying every attempt when no round passes
    /// - any generator or evaluator failure, unchanged
    pub async fn run(&self, task: &str) -> Result<RefinedResponse> {
        if task.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "task must not be empty".to_string(),
            ));
        }

        let run_id = uuid::Uuid::new_v4();
        let mut context = String::new();
        let mut memory: Vec<String> = Vec::new();
        let mut chain_of_thought: Vec<Generation> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let generation = self.generate(task, &context).await?;
            tracing::info!(
                workflow = "evaluator_optimizer",
                %run_id,
                iteration,
                thoughts = %generation.thoughts,
                "=== GENERATOR OUTPUT ===\n{}",
                generation.response
            );

            memory.push(generation.response.clone());
            chain_of_thought.push(generation);

            let content = memory.last().map(String::as_str).unwrap_or_default();
            let verdict = self.evaluate(content, task).await?;
            tracing::info!(
                workflow = "evaluator_optimizer",
                %run_id,
                iteration,
                evaluation = %verdict.evaluation,
                feedback = %verdict.feedback,
                "=== EVALUATOR OUTPUT ==="
            );

            if verdict.evaluation == Evaluation::Pass {
                return Ok(RefinedResponse {
                    final_solution: content.to_string(),
                    chain_of_thought,
                });
            }

            context = refinement_context(&memory, &verdict.feedback);
        }

        tracing::warn!(
            workflow = "evaluator_optimizer",
            %run_id,
            iterations = self.max_iterations,
            "Iteration cap reached without a passing solution"
        );
        Err(AgentflowError::MaxIterationsExceeded {
            iterations: self.max_iterations,
            chain_of_thought,
        })
    }

    async fn generate(&self, task: &str, context: &str) -> Result<Generation> {
        let prompt = format!("{}\n{context}\nTask: {task}", self.generator_prompt);
        self.invoker.complete_structured(&prompt).await
    }

    async fn evaluate(&self, content: &str, task: &str) -> Result<EvaluationResponse> {
        let prompt = format!(
            "{}\nOriginal task: {task}\nContent to evaluate: {content}",
            self.evaluator_prompt
        );
        self.invoker.complete_structured(&prompt).await
    }
}

/// Every prior attempt followed by the latest feedback
fn refinement_context(memory: &[String], feedback: &str) -> String {
    let mut context = String::from("Previous attempts:");
    for attempt in memory {
        context.push_str("\n- ");
        context.push_str(attempt);
    }
    context.push_str("\nFeedback: ");
    context.push_str(feedback);
    context
}

/// Builder for [`EvaluatorOptimizer`]
pub struct EvaluatorOptimizerBuilder {
    inner: EvaluatorOptimizer,
}

impl EvaluatorOptimizerBuilder {
    pub fn generator_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner.generator_prompt = prompt.into();
        self
    }

    pub fn evaluator_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner.evaluator_prompt = prompt.into();
        self
    }

    /// Generate/evaluate rounds before giving up (default 10)
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.inner.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<EvaluatorOptimizer> {
        if self.inner.generator_prompt.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "generator prompt must not be empty".to_string(),
            ));
        }
        if self.inner.evaluator_prompt.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "evaluator prompt must not be empty".to_string(),
            ));
        }
        if self.inner.max_iterations == 0 {
            return Err(AgentflowError::InvalidArgument(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(self.inner)
    }
}
