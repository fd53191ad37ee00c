//! Execution traces
//!
//! A trace records what each model call of one workflow invocation received
//! and produced. Traces are plain data; nothing reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Trace of a single step execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    /// Step name
    pub step_name: String,

    /// Full prompt sent to the model
    pub input: String,

    /// Model reply
    pub output: String,

    /// Duration of step execution
    pub duration_ms: u64,
}

impl StepTrace {
    pub fn new(
        step_name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            input: input.into(),
            output: output.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Complete execution trace for one workflow invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Identifier shared with the invocation's log lines
    pub run_id: Uuid,

    /// Workflow name
    pub workflow_name: String,

    pub started_at: DateTime<Utc>,

    /// Step traces in execution order
    pub steps: Vec<StepTrace>,

    /// Sum of step durations
    pub total_duration_ms: u64,
}

impl ExecutionTrace {
    /// Create a new execution trace
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow_name: workflow_name.into(),
            started_at: Utc::now(),
            steps: Vec::new(),
            total_duration_ms: 0,
        }
    }

    /// Add a step trace
    pub fn add_step(&mut self, step: StepTrace) {
        self.total_duration_ms += step.duration_ms;
        self.steps.push(step);
    }

    /// Get the number of completed steps
    pub fn completed_steps(&self) -> usize {
        self.steps.len()
    }

    /// Every intermediate output, in order
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.output.as_str())
    }
}
