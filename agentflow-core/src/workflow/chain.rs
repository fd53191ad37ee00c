//! Chain Workflow Pattern
//!
//! Sequential execution where each step's output feeds the next step's input.
//! Step `i` is sent `"{prompt_i}\n{previous output}"`; the first step sees the
//! caller's input. The reply of the last step is the result.

use std::time::Instant;

use crate::config::ChainSettings;
use crate::error::Result;
use crate::llm::ModelInvoker;

use super::execution::{ExecutionTrace, StepTrace};

/// Chain workflow for sequential LLM operations
#[derive(Clone)]
pub struct Chain {
    invoker: ModelInvoker,
    steps: Vec<String>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("step_count", &self.steps.len())
            .finish()
    }
}

impl Chain {
    /// Chain with the default report formatting steps
    pub fn new(invoker: ModelInvoker) -> Self {
        Self::from_settings(invoker, &ChainSettings::default())
    }

    pub fn from_settings(invoker: ModelInvoker, settings: &ChainSettings) -> Self {
        Self {
            invoker,
            steps: settings.steps.clone(),
        }
    }

    /// Create a new chain builder with no steps
    pub fn builder(invoker: ModelInvoker) -> ChainBuilder {
        ChainBuilder {
            invoker,
            steps: Vec::new(),
        }
    }

    /// Step prompts in execution order
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute the chain, returning the final output and a trace of every step.
    ///
    /// An empty chain returns the input unchanged. The first failing step
    /// aborts the run; no partial result is returned.
    pub async fn execute(&self, initial_input: &str) -> Result<(String, ExecutionTrace)> {
        let mut trace = ExecutionTrace::new("chain");
        let mut response = initial_input.to_string();

        tracing::info!(
            workflow = "chain",
            run_id = %trace.run_id,
            steps = self.steps.len(),
            "Starting chain"
        );

        for (index, prompt) in self.steps.iter().enumerate() {
            let step = index + 1;
            let input = format!("{prompt}\n{response}");
            let started = Instant::now();

            response = self.invoker.complete(&input).await.inspect_err(|err| {
                tracing::error!(workflow = "chain", run_id = %trace.run_id, step, error = %err, "Chain step failed");
            })?;

            tracing::info!(workflow = "chain", run_id = %trace.run_id, step, "STEP {step}:\n{response}");
            trace.add_step(StepTrace::new(
                format!("step_{step}"),
                input,
                response.clone(),
                started.elapsed(),
            ));
        }

        Ok((response, trace))
    }

    /// Execute the chain and return only the final output
    pub async fn run(&self, initial_input: &str) -> Result<String> {
        let (output, _) = self.execute(initial_input).await?;
        Ok(output)
    }
}

/// Builder for creating Chain workflows
pub struct ChainBuilder {
    invoker: ModelInvoker,
    steps: Vec<String>,
}

impl ChainBuilder {
    /// Append a step prompt
    pub fn step(mut self, prompt: impl Into<String>) -> Self {
        self.steps.push(prompt.into());
        self
    }

    /// Replace all step prompts
    pub fn steps<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = prompts.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Chain {
        Chain {
            invoker: self.invoker,
            steps: self.steps,
        }
    }
}
