//! Routing Workflow Pattern
//!
//! Two phases: a structured classification call picks a route name from the
//! table, then a single free-text call answers the input with that route's
//! specialised prompt. There is no fallback route.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RoutingSettings;
use crate::error::{AgentflowError, Result};
use crate::llm::{ModelInvoker, StructuredOutput};

use super::prompts;

/// Route name to specialised prompt
pub type RouteTable = BTreeMap<String, String>;

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSelection {
    pub reasoning: String,
    pub selection: String,
}

impl StructuredOutput for RouteSelection {
    const NAME: &'static str = "RouteSelection";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "reasoning": "string",
            "selection": "string"
        })
    }
}

/// Classification plus the selected route's reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedResponse {
    pub selection: RouteSelection,
    pub response: String,
}

/// Content-based router over a caller-supplied [`RouteTable`]
#[derive(Clone)]
pub struct Router {
    invoker: ModelInvoker,
    selector_prompt: String,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self::from_settings(invoker, &RoutingSettings::default())
    }

    pub fn from_settings(invoker: ModelInvoker, settings: &RoutingSettings) -> Self {
        Self {
            invoker,
            selector_prompt: settings.selector_prompt.clone(),
        }
    }

    /// Override the classifier template (`{routes}` and `{input}` placeholders)
    pub fn with_selector_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.selector_prompt = prompt.into();
        self
    }

    /// Route `input` and return the selected route's reply
    pub async fn route(&self, input: &str, routes: &RouteTable) -> Result<String> {
        Ok(self.dispatch(input, routes).await?.response)
    }

    /// Route `input`, keeping the classifier's reasoning alongside the reply.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `routes` is empty (no model call is made)
    /// - `RouteNotFound` if the classifier names a route outside the table;
    ///   the handler call is skipped
    pub async fn dispatch(&self, input: &str, routes: &RouteTable) -> Result<RoutedResponse> {
        if routes.is_empty() {
            return Err(AgentflowError::InvalidArgument(
                "routes map cannot be empty".to_string(),
            ));
        }

        let selection = self.classify(input, routes).await?;
        let key = selection.selection.trim();

        let Some(route_prompt) = routes.get(key) else {
            tracing::warn!(workflow = "routing", selection = %key, "Classifier selected unknown route");
            return Err(AgentflowError::RouteNotFound {
                selection: key.to_string(),
                available: routes.keys().cloned().collect(),
            });
        };

        let response = self
            .invoker
            .complete(&format!("{route_prompt}\nInput: {input}"))
            .await?;

        Ok(RoutedResponse {
            selection,
            response,
        })
    }

    async fn classify(&self, input: &str, routes: &RouteTable) -> Result<RouteSelection> {
        let names = routes.keys().map(String::as_str).collect::<Vec<_>>();
        let listing = format!("[{}]", names.join(", "));

        tracing::info!(workflow = "routing", routes = %listing, "Available routes");

        let prompt = prompts::render(
            &self.selector_prompt,
            &[("routes", listing.as_str()), ("input", input)],
        );
        let selection: RouteSelection = self.invoker.complete_structured(&prompt).await?;

        tracing::info!(
            workflow = "routing",
            route = %selection.selection,
            reasoning = %selection.reasoning,
            "Routing analysis complete"
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLLMProvider;
    use std::sync::Arc;

    fn table() -> RouteTable {
        RouteTable::from([
            ("billing".to_string(), "You are a billing expert.".to_string()),
            ("technical".to_string(), "You are a support engineer.".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_route_lists_names_in_order() {
        let provider = Arc::new(StubLLMProvider::new(|prompt| {
            if prompt.contains("select the most appropriate") {
                Ok(r#"{"reasoning": "invoice", "selection": " billing "}"#.to_string())
            } else {
                Ok(format!("handled: {prompt}"))
            }
        }));
        let router = Router::new(ModelInvoker::new(provider.clone()));

        let routed = router.dispatch("I was charged twice", &table()).await.unwrap();
        assert_eq!(routed.selection.reasoning, "invoice");
        assert_eq!(
            routed.response,
            "handled: You are a billing expert.\nInput: I was charged twice"
        );

        let prompts = provider.prompts();
        assert!(prompts[0].contains("[billing, technical]"));
        assert!(prompts[0].contains("Input: I was charged twice"));
    }

    #[tokio::test]
    async fn test_empty_routes_rejected_without_calls() {
        let provider = Arc::new(StubLLMProvider::echo());
        let router = Router::new(ModelInvoker::new(provider.clone()));

        let err = router.route("x", &RouteTable::new()).await.unwrap_err();
        assert!(matches!(err, AgentflowError::InvalidArgument(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_selector_prompt() {
        let provider = Arc::new(StubLLMProvider::new(|prompt| {
            if prompt.starts_with("PICK") {
                Ok(r#"{"reasoning": "r", "selection": "technical"}"#.to_string())
            } else {
                Ok("fixed".to_string())
            }
        }));
        let router = Router::new(ModelInvoker::new(provider.clone()))
            .with_selector_prompt("PICK {routes} FOR {input}");

        assert_eq!(router.route("crash", &table()).await.unwrap(), "fixed");
        assert!(provider.prompts()[0].starts_with("PICK [billing, technical] FOR crash"));
    }
}
