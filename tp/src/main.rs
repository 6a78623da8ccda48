//! TaskPilot CLI entry point
//!
//! A thin demo surface over the orchestrator: preview (and optionally
//! apply) task splits and description improvements against a seeded local
//! store or the remote entity API.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use taskpilot::cli::{Cli, Command, OutputFormat};
use taskpilot::{
    ChangeAgent, Config, EntityGateway, HttpGateway, InMemoryPreviewStore, LocalGateway, OllamaClient,
    OperationRequest,
};

use entitystore::TaskStore;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskpilot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("taskpilot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn build_agent(config: &Config, seed: Option<&PathBuf>) -> Result<ChangeAgent> {
    let gateway: Arc<dyn EntityGateway> = match seed {
        Some(path) => {
            let store = TaskStore::from_seed_file(path).context("Failed to load seed file")?;
            Arc::new(LocalGateway::new(Arc::new(store)))
        }
        None => Arc::new(HttpGateway::from_config(&config.gateway).context("Failed to build entity API client")?),
    };

    let generation = Arc::new(OllamaClient::from_config(&config.reasoning).context("Failed to build reasoning client")?);

    let previews = Arc::new(match config.preview.ttl_secs {
        Some(secs) => InMemoryPreviewStore::with_ttl(std::time::Duration::from_secs(secs)),
        None => InMemoryPreviewStore::new(),
    });

    Ok(ChangeAgent::new(gateway, generation, previews, config))
}

async fn run_operation(config: &Config, request: OperationRequest, seed: Option<PathBuf>, apply: bool) -> Result<()> {
    let agent = build_agent(config, seed.as_ref())?;

    let (id, preview) = agent.create_preview(request).await?;
    println!("{}", serde_json::to_string_pretty(&preview)?);

    if apply {
        let result = agent.execute_preview(&id).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Preview discarded (run with --apply to execute)");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    info!(
        "TaskPilot loaded config: model={}, base-url={}",
        config.reasoning.model, config.reasoning.base_url
    );

    match cli.command {
        Command::Operations { format } => {
            let agent = build_agent(&config, None)?;
            let operations = agent.operations();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&operations)?),
                OutputFormat::Text => {
                    for op in operations {
                        let marker = if op.implemented { "" } else { " (not yet implemented)" };
                        println!("{}{}", op.name, marker);
                        println!("    {}", op.description);
                        println!("    requires: {}", op.required_inputs.join(", "));
                    }
                }
            }
            Ok(())
        }
        Command::Status => {
            let agent = build_agent(&config, None)?;
            let status = agent.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Split { task_ids, seed, apply } => {
            run_operation(&config, OperationRequest::split_tasks(task_ids), seed, apply).await
        }
        Command::Improve { task_ids, seed, apply } => {
            run_operation(&config, OperationRequest::improve_descriptions(task_ids), seed, apply).await
        }
    }
}
