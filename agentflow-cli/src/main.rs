//! Agentflow CLI - run the workflow patterns against a configured model

mod support;

use std::path::PathBuf;

use agentflow_core::config::{AgentflowConfig, LLMProviderConfig, ProviderKind};
use agentflow_core::llm::ModelInvoker;
use agentflow_core::workflow::{Chain, EvaluatorOptimizer, Orchestrator, Parallel, Router};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentflow")]
#[command(about = "Run composable LLM workflow patterns", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// LLM provider (openai or ollama)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name passed to the provider
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a report into a sorted markdown table through a prompt chain
    Chain {
        /// Read the report from a file instead of the built-in sample
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Route a sample support ticket to a specialist
    Route {
        /// Incident id (INC001, INC002, INC003)
        incident_id: String,
    },
    /// Analyse market impact for each stakeholder group concurrently
    Parallel {
        /// Maximum concurrent model calls
        #[arg(short = 'n', long)]
        concurrency: Option<usize>,
    },
    /// Plan a writing task and answer each subtask with a worker
    Orchestrate {
        /// Task description
        task: Option<String>,

        /// Workers allowed to run at once
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Iteratively generate and evaluate a solution
    Evaluate {
        /// Task description
        task: Option<String>,

        /// Generate/evaluate rounds before giving up
        #[arg(short, long)]
        max_iterations: Option<usize>,
    },
    /// Print the effective configuration
    Config,
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("agentflow {}", env!("CARGO_PKG_VERSION"));
        println!("agentflow-core {}", agentflow_core::VERSION);
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Version => {}
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&redacted(&config))?);
        }
        Commands::Chain { file } => {
            let report = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => support::Q3_REPORT.to_string(),
            };
            let chain = Chain::from_settings(invoker(&config)?, &config.chain);
            println!("{}", chain.run(&report).await?);
        }
        Commands::Route { incident_id } => match support::ticket(&incident_id) {
            None => println!("Ticket not found for id: {incident_id}"),
            Some(ticket) => {
                let router = Router::from_settings(invoker(&config)?, &config.routing);
                println!("{}", router.route(ticket, &support::support_routes()).await?);
            }
        },
        Commands::Parallel { concurrency } => {
            let parallel = Parallel::new(invoker(&config)?);
            let results = parallel
                .run(
                    support::STAKEHOLDER_PROMPT,
                    &support::stakeholders(),
                    concurrency.unwrap_or(config.parallel.concurrency),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Orchestrate { task, workers } => {
            let mut settings = config.orchestrator.clone();
            if let Some(workers) = workers {
                settings.worker_concurrency = workers;
            }
            let orchestrator = Orchestrator::from_settings(invoker(&config)?, &settings)?;
            let task = task.unwrap_or_else(|| support::DEFAULT_PRODUCT_TASK.to_string());
            let response = orchestrator.process(&task).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Evaluate {
            task,
            max_iterations,
        } => {
            let mut settings = config.evaluator.clone();
            if let Some(max) = max_iterations {
                settings.max_iterations = max;
            }
            let optimizer = EvaluatorOptimizer::from_settings(invoker(&config)?, &settings)?;
            let task = task.unwrap_or_else(|| support::DEFAULT_CODING_TASK.to_string());
            let refined = optimizer.run(&task).await?;
            println!("{}", serde_json::to_string_pretty(&refined)?);
        }
    }

    Ok(())
}

/// Configuration file or layered sources, then command-line overrides
fn load_config(cli: &Cli) -> Result<AgentflowConfig> {
    let mut config = match &cli.config {
        Some(path) => AgentflowConfig::load_with_file(path)?,
        None => AgentflowConfig::load()?,
    };

    if let Some(provider) = &cli.provider {
        let kind: ProviderKind = provider.parse()?;
        // keep model and endpoint settings when the provider is unchanged
        if !config.llm.as_ref().is_some_and(|llm| llm.provider == kind) {
            config.llm = Some(LLMProviderConfig::new(kind));
        }
    }

    if let Some(model) = &cli.model {
        let llm = config
            .llm
            .as_mut()
            .context("--model requires a provider (--provider or llm.provider in config)")?;
        llm.model = model.clone();
    }

    Ok(config)
}

fn invoker(config: &AgentflowConfig) -> Result<ModelInvoker> {
    let invoker = config.invoker()?;
    let info = invoker.model_info();
    tracing::info!(provider = %info.provider, model = %info.model_name, "Using model");
    Ok(invoker)
}

fn redacted(config: &AgentflowConfig) -> AgentflowConfig {
    let mut config = config.clone();
    if let Some(key) = config.llm.as_mut().and_then(|llm| llm.api_key.as_mut()) {
        *key = "***".to_string();
    }
    config
}
