//! End-to-end behaviour of the five workflows against the stub provider

use agentflow_core::llm::{InvocationSettings, ModelInvoker, RetryConfig, StubLLMProvider};
use agentflow_core::workflow::{
    Chain, EvaluatorOptimizer, Orchestrator, Parallel, RouteTable, Router,
};
use agentflow_core::AgentflowError;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn invoker(provider: &Arc<StubLLMProvider>) -> ModelInvoker {
    ModelInvoker::with_settings(
        provider.clone(),
        InvocationSettings {
            retry: RetryConfig::no_retry(),
            ..Default::default()
        },
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Text after the last `Input: ` marker
fn input_of(prompt: &str) -> &str {
    prompt.rsplit("Input: ").next().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// `f(p, x)` = first line of the prompt applied to the remainder
fn applying_provider() -> Arc<StubLLMProvider> {
    Arc::new(StubLLMProvider::new(|prompt| {
        let (step, rest) = prompt.split_once('\n').unwrap_or((prompt, ""));
        Ok(format!("{step}[{rest}]"))
    }))
}

#[tokio::test]
async fn chain_is_a_left_fold_over_steps() {
    let provider = applying_provider();
    let chain = Chain::builder(invoker(&provider))
        .steps(["p1", "p2", "p3"])
        .build();

    let output = assert_ok!(chain.run("x0").await);
    assert_eq!(output, "p3[p2[p1[x0]]]");

    let (_, trace) = assert_ok!(chain.execute("x0").await);
    let intermediate: Vec<&str> = trace.outputs().collect();
    assert_eq!(intermediate, vec!["p1[x0]", "p2[p1[x0]]", "p3[p2[p1[x0]]]"]);
}

#[tokio::test]
async fn chain_is_order_sensitive() {
    let provider = applying_provider();
    let forward = Chain::builder(invoker(&provider)).steps(["a", "b"]).build();
    let reverse = Chain::builder(invoker(&provider)).steps(["b", "a"]).build();

    assert_ne!(
        assert_ok!(forward.run("x").await),
        assert_ok!(reverse.run("x").await)
    );
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

fn support_routes() -> RouteTable {
    RouteTable::from([
        ("billing".to_string(), "BILLING PROMPT".to_string()),
        ("technical".to_string(), "TECH PROMPT".to_string()),
    ])
}

fn classifier_choosing(selection: &'static str) -> Arc<StubLLMProvider> {
    Arc::new(StubLLMProvider::new(move |prompt| {
        if prompt.contains("select the most appropriate support team") {
            Ok(format!(
                r#"{{"reasoning": "matched keywords", "selection": "{selection}"}}"#
            ))
        } else {
            Ok(format!("answered<{prompt}>"))
        }
    }))
}

#[tokio::test]
async fn routing_dispatches_to_selected_prompt() {
    let provider = classifier_choosing("technical");
    let router = Router::new(invoker(&provider));

    let response = assert_ok!(router.route("App crashes on login", &support_routes()).await);
    assert_eq!(response, "answered<TECH PROMPT\nInput: App crashes on login>");
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn routing_unknown_selection_skips_handler() {
    let provider = classifier_choosing("legal");
    let router = Router::new(invoker(&provider));

    let err = assert_err!(router.route("Contract question", &support_routes()).await);
    match err {
        AgentflowError::RouteNotFound {
            selection,
            available,
        } => {
            assert_eq!(selection, "legal");
            assert_eq!(available, vec!["billing", "technical"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn routing_with_no_routes_makes_no_calls() {
    let provider = classifier_choosing("billing");
    let router = Router::new(invoker(&provider));

    let err = assert_err!(router.route("anything", &RouteTable::new()).await);
    assert!(matches!(err, AgentflowError::InvalidArgument(_)));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn routing_malformed_classifier_output() {
    let provider = Arc::new(StubLLMProvider::new(|_| Ok("billing, probably".to_string())));
    let router = Router::new(invoker(&provider));

    let err = assert_err!(router.route("refund", &support_routes()).await);
    assert!(matches!(err, AgentflowError::MalformedOutput { .. }));
    assert_eq!(provider.call_count(), 1);
}

// ---------------------------------------------------------------------------
// Parallelization
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn parallel_preserves_input_order_under_inverted_latency() {
    let provider = Arc::new(
        StubLLMProvider::new(|prompt| Ok(format!("f({})", input_of(prompt))))
            .with_latency(|prompt| match input_of(prompt) {
                "a" => Duration::from_millis(300),
                "b" => Duration::from_millis(200),
                _ => Duration::from_millis(100),
            }),
    );
    let parallel = Parallel::new(invoker(&provider));

    let out = assert_ok!(parallel.run("T", &strings(&["a", "b", "c"]), 2).await);
    assert_eq!(out, vec!["f(a)", "f(b)", "f(c)"]);
}

#[tokio::test(start_paused = true)]
async fn parallel_never_exceeds_concurrency() {
    let provider = Arc::new(
        StubLLMProvider::echo().with_latency(|_| Duration::from_millis(50)),
    );
    let parallel = Parallel::new(invoker(&provider));
    let inputs: Vec<String> = (0..10).map(|i| format!("item-{i}")).collect();

    let out = assert_ok!(parallel.run("T", &inputs, 3).await);
    assert_eq!(out.len(), 10);
    assert_eq!(provider.call_count(), 10);
    assert_eq!(provider.peak_concurrency(), 3);
}

#[tokio::test]
async fn parallel_invalid_arguments_make_no_calls() {
    let provider = Arc::new(StubLLMProvider::echo());
    let parallel = Parallel::new(invoker(&provider));

    assert!(matches!(
        parallel.run("T", &strings(&["a"]), 0).await,
        Err(AgentflowError::InvalidArgument(_))
    ));
    assert!(matches!(
        parallel.run("T", &[], 2).await,
        Err(AgentflowError::InvalidArgument(_))
    ));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn parallel_failure_identifies_input() {
    let provider = Arc::new(StubLLMProvider::new(|prompt| {
        if input_of(prompt) == "b" {
            Err(AgentflowError::ModelInvocation {
                provider: "stub".to_string(),
                status: Some(400),
                message: "rejected".to_string(),
            })
        } else {
            Ok("ok".to_string())
        }
    }));
    let parallel = Parallel::new(invoker(&provider));

    let err = assert_err!(parallel.run("T", &strings(&["a", "b", "c"]), 1).await);
    assert!(err.to_string().contains('b'));
    match &err {
        AgentflowError::UnitFailed { index, input, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(input, "b");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        err.root_cause(),
        AgentflowError::ModelInvocation { .. }
    ));
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

const THREE_TASK_PLAN: &str = r#"```json
{
  "analysis": "three styles",
  "tasks": [
    {"type": "formal", "description": "specs first"},
    {"type": "conversational", "description": "friendly"},
    {"type": "playful", "description": "jokes"}
  ]
}
```"#;

fn style_of(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Style: "))
        .unwrap_or_default()
        .to_string()
}

#[tokio::test(start_paused = true)]
async fn orchestrator_aligns_workers_with_plan_when_concurrent() {
    let provider = Arc::new(
        StubLLMProvider::new(|prompt| {
            if prompt.starts_with("Analyze this task") {
                Ok(THREE_TASK_PLAN.to_string())
            } else {
                Ok(format!("{} draft", style_of(prompt)))
            }
        })
        .with_latency(|prompt| match style_of(prompt).as_str() {
            "formal" => Duration::from_millis(300),
            "conversational" => Duration::from_millis(200),
            _ => Duration::from_millis(10),
        }),
    );
    let orchestrator = assert_ok!(
        Orchestrator::builder(invoker(&provider))
            .worker_concurrency(3)
            .build()
    );

    let result = assert_ok!(orchestrator.process("eco-friendly water bottle").await);
    assert_eq!(result.analysis, "three styles");
    assert_eq!(
        result.worker_responses,
        vec!["formal draft", "conversational draft", "playful draft"]
    );
}

#[tokio::test]
async fn orchestrator_planning_failure_runs_no_workers() {
    let provider = Arc::new(StubLLMProvider::new(|_| Ok("I would rather not plan".to_string())));
    let orchestrator = Orchestrator::new(invoker(&provider));

    let err = assert_err!(orchestrator.process("anything").await);
    assert!(matches!(err, AgentflowError::MalformedOutput { .. }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn orchestrator_worker_failure_aborts_whole_run() {
    let provider = Arc::new(StubLLMProvider::new(|prompt| {
        if prompt.starts_with("Analyze this task") {
            return Ok(THREE_TASK_PLAN.to_string());
        }
        match style_of(prompt).as_str() {
            "conversational" => Err(AgentflowError::ModelInvocation {
                provider: "stub".into(),
                status: Some(400),
                message: "rejected".into(),
            }),
            style => Ok(format!("{style} draft")),
        }
    }));
    let orchestrator = Orchestrator::new(invoker(&provider));

    let err = assert_err!(orchestrator.process("eco-friendly water bottle").await);
    match err {
        AgentflowError::UnitFailed { index, input, .. } => {
            assert_eq!(index, 1);
            assert_eq!(input, "conversational: friendly");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // plan, formal, conversational; playful never starts
    let styles: Vec<String> = provider.prompts()[1..].iter().map(|p| style_of(p)).collect();
    assert_eq!(styles, vec!["formal", "conversational"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn orchestrator_default_workers_follow_plan_order() {
    let styles: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    let tasks: Vec<serde_json::Value> = styles
        .iter()
        .map(|style| serde_json::json!({ "type": style, "description": "d" }))
        .collect();
    let plan = serde_json::json!({ "analysis": "many", "tasks": tasks }).to_string();

    for _ in 0..10 {
        let plan = plan.clone();
        let provider = Arc::new(
            StubLLMProvider::new(move |prompt| {
                if prompt.starts_with("Analyze this task") {
                    Ok(plan.clone())
                } else {
                    Ok(style_of(prompt))
                }
            })
            .with_latency(|prompt| {
                let n = style_of(prompt).len() as u64;
                Duration::from_micros(300 * (n % 3))
            }),
        );
        let orchestrator = Orchestrator::new(invoker(&provider));

        let result = assert_ok!(orchestrator.process("many angles").await);
        assert_eq!(result.worker_responses, styles);

        let started: Vec<String> = provider.prompts()[1..].iter().map(|p| style_of(p)).collect();
        assert_eq!(started, styles);
        assert_eq!(provider.peak_concurrency(), 1);
    }
}

// ---------------------------------------------------------------------------
// Evaluator / optimizer
// ---------------------------------------------------------------------------

fn generation(n: usize) -> String {
    format!(r#"{{"thoughts": "attempt {n}", "response": "solution {n}"}}"#)
}

fn verdict(evaluation: &str) -> String {
    format!(r#"{{"evaluation": "{evaluation}", "feedback": "feedback for {evaluation}"}}"#)
}

#[tokio::test]
async fn evaluator_refines_until_pass() {
    let provider = Arc::new(StubLLMProvider::scripted(vec![
        Ok(generation(1)),
        Ok(verdict("FAIL")),
        Ok(generation(2)),
        Ok(verdict("NEEDS_IMPROVEMENT")),
        Ok(generation(3)),
        Ok(verdict("PASS")),
    ]));
    let optimizer = EvaluatorOptimizer::new(invoker(&provider));

    let refined = assert_ok!(optimizer.run("implement a min stack").await);
    assert_eq!(refined.chain_of_thought.len(), 3);
    assert_eq!(refined.final_solution, "solution 3");
    assert_eq!(
        refined.final_solution,
        refined.chain_of_thought.last().map(|g| g.response.clone()).unwrap()
    );

    // the third generation sees both earlier attempts and the latest feedback
    let third_generation_prompt = &provider.prompts()[4];
    assert!(third_generation_prompt.contains(
        "Previous attempts:\n- solution 1\n- solution 2\nFeedback: feedback for NEEDS_IMPROVEMENT"
    ));
}

#[tokio::test]
async fn evaluator_accepts_first_pass() {
    let provider = Arc::new(StubLLMProvider::scripted(vec![
        Ok(generation(1)),
        Ok(verdict("PASS")),
    ]));
    let optimizer = EvaluatorOptimizer::new(invoker(&provider));

    let refined = assert_ok!(optimizer.run("task").await);
    assert_eq!(refined.chain_of_thought.len(), 1);
    assert_eq!(refined.final_solution, "solution 1");
}

#[tokio::test]
async fn evaluator_stops_at_iteration_cap() {
    let provider = Arc::new(StubLLMProvider::new(|prompt| {
        if prompt.contains("Content to evaluate:") {
            Ok(verdict("FAIL"))
        } else {
            Ok(generation(0))
        }
    }));
    let optimizer = assert_ok!(
        EvaluatorOptimizer::builder(invoker(&provider))
            .max_iterations(3)
            .build()
    );

    let err = assert_err!(optimizer.run("impossible task").await);
    match err {
        AgentflowError::MaxIterationsExceeded {
            iterations,
            chain_of_thought,
        } => {
            assert_eq!(iterations, 3);
            assert_eq!(chain_of_thought.len(), 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.call_count(), 6);
}

#[tokio::test]
async fn evaluator_rejects_unknown_verdict() {
    let provider = Arc::new(StubLLMProvider::scripted(vec![
        Ok(generation(1)),
        Ok(verdict("MAYBE")),
    ]));
    let optimizer = EvaluatorOptimizer::new(invoker(&provider));

    let err = assert_err!(optimizer.run("task").await);
    assert!(matches!(err, AgentflowError::MalformedOutput { .. }));
}

// ---------------------------------------------------------------------------
// Idempotence and retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_invocations_yield_identical_outputs() {
    let provider = applying_provider();
    let chain = Chain::builder(invoker(&provider)).steps(["a", "b"]).build();
    let parallel = Parallel::new(invoker(&provider));
    let items = strings(&["x", "y"]);

    let (first, second) = futures::future::join(chain.run("seed"), chain.run("seed")).await;
    assert_eq!(assert_ok!(first), assert_ok!(second));

    let runs = futures::future::join_all((0..2).map(|_| parallel.run("T", &items, 2))).await;
    let outputs: Vec<Vec<String>> = runs.into_iter().map(|run| assert_ok!(run)).collect();
    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_inside_workflows() {
    let provider = Arc::new(StubLLMProvider::scripted(vec![
        Err(AgentflowError::ModelInvocation {
            provider: "stub".to_string(),
            status: Some(503),
            message: "overloaded".to_string(),
        }),
        Ok("recovered".to_string()),
    ]));
    let invoker = ModelInvoker::with_settings(
        provider.clone(),
        InvocationSettings {
            retry: RetryConfig::default().with_max_attempts(3),
            ..Default::default()
        },
    );
    let chain = Chain::builder(invoker).step("only").build();

    assert_eq!(assert_ok!(chain.run("x").await), "recovered");
    assert_eq!(provider.call_count(), 2);
}
