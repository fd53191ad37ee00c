//! Deterministic in-process provider
//!
//! Replies are produced by a closure over the prompt, optionally after a
//! simulated latency. Every prompt is logged so callers can assert on what a
//! workflow actually sent, and the peak number of concurrent calls is tracked.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{AgentflowError, Result};

use super::{LLMProvider, LLMRequest, LLMResponse, ModelInfo};

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;
type Latency = dyn Fn(&str) -> Duration + Send + Sync;

/// Closure-driven [`LLMProvider`] for tests and offline runs
#[derive(Clone)]
pub struct StubLLMProvider {
    responder: Arc<Responder>,
    latency: Option<Arc<Latency>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for StubLLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubLLMProvider")
            .field("calls", &self.call_count())
            .field("has_latency", &self.latency.is_some())
            .finish()
    }
}

impl StubLLMProvider {
    /// Reply with `responder(prompt)`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            latency: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Echo the prompt back
    pub fn echo() -> Self {
        Self::new(|prompt| Ok(prompt.to_string()))
    }

    /// Reply with the scripted results in order.
    ///
    /// Once the script runs out every further call fails.
    pub fn scripted(replies: Vec<Result<String>>) -> Self {
        let script = Mutex::new(VecDeque::from(replies));
        Self::new(move |_| {
            lock(&script)
                .pop_front()
                .unwrap_or_else(|| Err(AgentflowError::Other("stub script exhausted".into())))
        })
    }

    /// Sleep for `latency(prompt)` before replying
    pub fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Prompts received so far, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Highest number of calls that were in progress at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decrements the in-flight counter even when the call is dropped mid-sleep
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMProvider for StubLLMProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        let prompt = request.user_text();
        lock(&self.calls).push(prompt.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(latency) = &self.latency {
            tokio::time::sleep(latency(&prompt)).await;
        }

        let content = (self.responder)(&prompt)?;
        Ok(LLMResponse {
            content,
            usage: None,
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "stub".to_string(),
            model_name: "stub".to_string(),
        }
    }
}
