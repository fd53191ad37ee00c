//! Parallel Workflow Pattern
//!
//! Applies one prompt template to many inputs concurrently. Units start in
//! input order, at most `concurrency` of them run at once, every spawned unit
//! is joined before returning, and outputs come back in input order
//! regardless of completion order. A concurrency of 1 is strictly sequential.
//!
//! The first failure wins: running siblings are cancelled, units not yet
//! started never start, and the error names the input that failed. No
//! partial results are returned.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{AgentflowError, Result};
use crate::llm::ModelInvoker;

/// One prompt to run inside a fan-out
#[derive(Debug, Clone)]
pub(crate) struct FanOutUnit {
    /// Human-readable identity reported on failure
    pub label: String,
    pub prompt: String,
}

enum UnitOutcome {
    Done(String),
    Failed(AgentflowError),
    Cancelled,
}

enum FirstFailure {
    Unit(usize, AgentflowError),
    Panic(String),
}

/// Run every unit through `invoker.complete` with bounded concurrency.
///
/// Callers validate arguments; `concurrency` must be at least 1.
pub(crate) async fn fan_out(
    invoker: &ModelInvoker,
    units: Vec<FanOutUnit>,
    concurrency: usize,
    workflow: &'static str,
) -> Result<Vec<String>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let cancel = CancellationToken::new();
    let labels: Vec<String> = units.iter().map(|u| u.label.clone()).collect();

    let mut set = JoinSet::new();
    for (index, unit) in units.into_iter().enumerate() {
        // Permits are taken in index order, so with one permit units run in order
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(workflow, unit = index, "Fan-out stopped before unit started");
                break;
            }
            permit = semaphore.clone().acquire_owned() => permit
                .map_err(|_| AgentflowError::Other("fan-out semaphore closed".to_string()))?,
        };

        let invoker = invoker.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            // A panicking unit drops this guard and stops the remaining units
            let panic_guard = cancel.clone().drop_guard();
            tracing::debug!(workflow, unit = index, "Unit started");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => UnitOutcome::Cancelled,
                result = invoker.complete(&unit.prompt) => match result {
                    Ok(text) => UnitOutcome::Done(text),
                    Err(err) => UnitOutcome::Failed(err),
                },
            };

            // Cancel while still holding the permit so no later unit can start
            if matches!(outcome, UnitOutcome::Failed(_)) {
                cancel.cancel();
            }
            let _ = panic_guard.disarm();
            drop(permit);
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<String>> = vec![None; labels.len()];
    let mut seen = vec![false; labels.len()];
    let mut first_failure: Option<FirstFailure> = None;

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                seen[index] = true;
                match outcome {
                    UnitOutcome::Done(text) => {
                        tracing::debug!(workflow, unit = index, "Unit completed");
                        slots[index] = Some(text);
                    }
                    UnitOutcome::Failed(err) => {
                        tracing::warn!(workflow, unit = index, error = %err, "Unit failed");
                        if first_failure.is_none() {
                            cancel.cancel();
                            first_failure = Some(FirstFailure::Unit(index, err));
                        }
                    }
                    UnitOutcome::Cancelled => {
                        tracing::debug!(workflow, unit = index, "Unit cancelled");
                    }
                }
            }
            Err(join_err) => {
                tracing::error!(workflow, error = %join_err, "Unit task aborted");
                if first_failure.is_none() {
                    cancel.cancel();
                    first_failure = Some(FirstFailure::Panic(join_err.to_string()));
                }
            }
        }
    }

    match first_failure {
        Some(FirstFailure::Unit(index, err)) => Err(AgentflowError::UnitFailed {
            index,
            input: labels[index].clone(),
            source: Box::new(err),
        }),
        Some(FirstFailure::Panic(message)) => {
            // A panicked task never reports its index; it is the first unit with no outcome
            let index = seen.iter().position(|s| !s).unwrap_or_default();
            Err(AgentflowError::UnitFailed {
                index,
                input: labels.get(index).cloned().unwrap_or_default(),
                source: Box::new(AgentflowError::Other(message)),
            })
        }
        None => slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AgentflowError::Other("fan-out finished with missing results".into())),
    }
}

/// Applies a prompt template to many inputs concurrently
#[derive(Clone)]
pub struct Parallel {
    invoker: ModelInvoker,
}

impl std::fmt::Debug for Parallel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parallel").finish_non_exhaustive()
    }
}

impl Parallel {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Run `"{prompt_template}\nInput: {input}"` for every input.
    ///
    /// `result[i]` is the reply for `inputs[i]`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank template, no inputs or zero concurrency,
    ///   checked before any model call
    /// - `UnitFailed` identifying the first input whose call failed
    pub async fn run(
        &self,
        prompt_template: &str,
        inputs: &[String],
        concurrency: usize,
    ) -> Result<Vec<String>> {
        if prompt_template.trim().is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "prompt cannot be empty".to_string(),
            ));
        }
        if inputs.is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "inputs list cannot be empty".to_string(),
            ));
        }
        if concurrency == 0 {
            return Err(AgentflowError::InvalidArgument(
                "number of workers must be greater than 0".to_string(),
            ));
        }

        let units = inputs
            .iter()
            .map(|input| FanOutUnit {
                label: input.clone(),
                prompt: format!("{prompt_template}\nInput: {input}"),
            })
            .collect();

        tracing::info!(
            workflow = "parallel",
            units = inputs.len(),
            concurrency,
            "Starting parallel fan-out"
        );
        fan_out(&self.invoker, units, concurrency, "parallel").await
    }
}
