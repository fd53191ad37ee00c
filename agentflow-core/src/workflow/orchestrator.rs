//! Orchestrator-Workers Pattern
//!
//! A planning call decomposes the task into typed subtasks; each subtask is
//! then answered by a worker call. Worker replies line up with the plan:
//! `worker_responses[i]` answers `tasks[i]`.

use serde::{Deserialize, Serialize};

use crate::config::OrchestratorSettings;
use crate::error::{AgentflowError, Result};
use crate::llm::{ModelInvoker, StructuredOutput};

use super::parallel::{FanOutUnit, fan_out};
use super::prompts;

/// A unit of work proposed by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    #[serde(rename = "type")]
    pub task_type: String,
    pub description: String,
}

/// Planner output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorResponse {
    pub analysis: String,
    pub tasks: Vec<SubTask>,
}

impl StructuredOutput for OrchestratorResponse {
    const NAME: &'static str = "OrchestratorResponse";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "analysis": "string",
            "tasks": [{ "type": "string", "description": "string" }]
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.tasks.is_empty() {
            return Err("plan contains no tasks".to_string());
        }
        Ok(())
    }
}

/// Planner analysis plus one worker reply per subtask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResponse {
    pub analysis: String,
    pub worker_responses: Vec<String>,
}

/// Orchestrator-workers workflow
#[derive(Clone)]
pub struct Orchestrator {
    invoker: ModelInvoker,
    orchestrator_prompt: String,
    worker_prompt: String,
    worker_concurrency: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("worker_concurrency", &self.worker_concurrency)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator with the default prompts and sequential workers
    pub fn new(invoker: ModelInvoker) -> Self {
        Self {
            invoker,
            orchestrator_prompt: prompts::ORCHESTRATOR.to_string(),
            worker_prompt: prompts::WORKER.to_string(),
            worker_concurrency: 1,
        }
    }

    pub fn from_settings(invoker: ModelInvoker, settings: &OrchestratorSettings) -> Result<Self> {
        Self::builder(invoker)
            .orchestrator_prompt(settings.orchestrator_prompt.clone())
            .worker_prompt(settings.worker_prompt.clone())
            .worker_concurrency(settings.worker_concurrency)
            .build()
    }

    pub fn builder(invoker: ModelInvoker) -> OrchestratorBuilder {
        OrchestratorBuilder {
            inner: Self::new(invoker),
        }
    }

    /// Plan the task, then run one worker per subtask.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank task description
    /// - `MalformedOutput` when the plan cannot be decoded or has no tasks;
    ///   no worker runs in that case
    /// - `UnitFailed` naming the first subtask whose worker failed
    pub async fn process(&self, task_description: &str) -> Result<FinalResponse> {
        if task_description.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "task description must not be empty".to_string(),
            ));
        }

        let plan_prompt = prompts::render(&self.orchestrator_prompt, &[("task", task_description)]);
        let plan: OrchestratorResponse = self.invoker.complete_structured(&plan_prompt).await?;

        tracing::info!(
            workflow = "orchestrator",
            analysis = %plan.analysis,
            tasks = plan.tasks.len(),
            "=== ORCHESTRATOR OUTPUT ==="
        );

        let units = plan
            .tasks
            .iter()
            .map(|task| FanOutUnit {
                label: format!("{}: {}", task.task_type, task.description),
                prompt: prompts::render(
                    &self.worker_prompt,
                    &[
                        ("original_task", task_description),
                        ("task_type", task.task_type.as_str()),
                        ("task_description", task.description.as_str()),
                    ],
                ),
            })
            .collect();

        let worker_responses =
            fan_out(&self.invoker, units, self.worker_concurrency, "orchestrator").await?;

        tracing::info!(
            workflow = "orchestrator",
            workers = worker_responses.len(),
            "=== WORKER OUTPUT ==="
        );

        Ok(FinalResponse {
            analysis: plan.analysis,
            worker_responses,
        })
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    inner: Orchestrator,
}

impl OrchestratorBuilder {
    /// Planner template with a `{task}` placeholder
    pub fn orchestrator_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner.orchestrator_prompt = prompt.into();
        self
    }

    /// Worker template with `{original_task}`, `{task_type}` and
    /// `{task_description}` placeholders
    pub fn worker_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner.worker_prompt = prompt.into();
        self
    }

    /// Workers allowed to run at once (default 1)
    pub fn worker_concurrency(mut self, concurrency: usize) -> Self {
        self.inner.worker_concurrency = concurrency;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        if self.inner.orchestrator_prompt.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "orchestrator prompt must not be empty".to_string(),
            ));
        }
        if self.inner.worker_prompt.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "worker prompt must not be empty".to_string(),
            ));
        }
        if self.inner.worker_concurrency == 0 {
            return Err(AgentflowError::InvalidArgument(
                "worker concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(self.inner)
    }
}
