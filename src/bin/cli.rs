use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use compute_toggle::prelude::*;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "compute-toggle")]
#[command(about = "Start or stop tagged compute instances on demand", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the services YAML file (backends for compute, ledger, notifier)
    #[arg(short, long, global = true)]
    services: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one invocation and print the response
    Invoke {
        /// Path to a JSON request; read from stdin when neither this nor --action is given
        #[arg(short, long, value_name = "FILE", conflicts_with = "action")]
        event: Option<PathBuf>,

        /// Shorthand for the request {"action": ACTION}
        #[arg(short, long)]
        action: Option<String>,
    },

    /// Resolve the environment and services file without invoking anything
    CheckConfig,

    /// Show the most recent records of a file ledger
    Records {
        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "otel")]
fn init_otel_tracing(verbose: bool) {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::runtime::Tokio;
    use opentelemetry_sdk::trace::TracerProvider;

    let filter = if verbose {
        "compute_toggle=debug"
    } else {
        "compute_toggle=info"
    };

    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .build()
        .expect("Failed to create OTLP exporter");

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .build();

    let tracer = provider.tracer("compute-toggle");
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(otel_layer)
        .init();

    opentelemetry::global::set_tracer_provider(provider);
}

#[cfg(not(feature = "otel"))]
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "compute_toggle=debug"
    } else {
        "compute_toggle=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "otel")]
    init_otel_tracing(cli.verbose);

    #[cfg(not(feature = "otel"))]
    init_tracing(cli.verbose);

    let result = run(cli).await;

    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "compute-toggle failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let services = cli.services.as_deref();

    match cli.command {
        Commands::Invoke { event, action } => invoke(services, event, action).await,
        Commands::CheckConfig => check_config(services),
        Commands::Records { limit, json } => records(services, limit, json).await,
    }
}

async fn read_event(
    event: Option<PathBuf>,
    action: Option<String>,
) -> anyhow::Result<serde_json::Value> {
    if let Some(action) = action {
        return Ok(serde_json::json!({ "action": action }));
    }

    let raw = match event {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            raw
        }
    };

    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("Request is not valid JSON: {}", e))
}

async fn invoke(
    services_path: Option<&Path>,
    event: Option<PathBuf>,
    action: Option<String>,
) -> anyhow::Result<bool> {
    let settings = Settings::from_env()?;
    let services = ServicesConfig::load_or_default(services_path)?.build(&settings)?;
    let orchestrator = Orchestrator::new(
        services,
        &settings.tag_key,
        &settings.tag_value,
        settings.call_timeout(),
    );

    let event = read_event(event, action).await?;
    let outcome = orchestrator.invoke(&event).await;

    tracing::debug!(
        execution_id = %outcome.execution_id,
        phase = ?outcome.phase,
        "Invocation complete"
    );
    println!("{}", serde_json::to_string_pretty(&outcome.response)?);

    Ok(outcome.response.is_success())
}

fn check_config(services_path: Option<&Path>) -> anyhow::Result<bool> {
    let settings = Settings::from_env()?;
    let config = ServicesConfig::load_or_default(services_path)?;
    config.build(&settings)?;

    println!("Tag predicate:    {}={}", settings.tag_key, settings.tag_value);
    println!("Ledger table:     {}", settings.ledger_table);
    println!("Notify channel:   {}", settings.notify_channel);
    println!("Call timeout:     {}ms\n", settings.timeout_ms);
    println!("Services:\n{}", serde_yaml::to_string(&config)?);

    Ok(true)
}

async fn records(services_path: Option<&Path>, limit: usize, json: bool) -> anyhow::Result<bool> {
    let settings = Settings::from_env()?;
    let config = ServicesConfig::load_or_default(services_path)?;
    let ledger = config
        .file_ledger(&settings)
        .ok_or_else(|| anyhow::anyhow!("The configured ledger is not a file ledger"))?;

    let all = ledger.read_records().await?;
    let recent: Vec<&ExecutionRecord> = all.iter().rev().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(true);
    }

    if recent.is_empty() {
        println!("No records in {}", ledger.path().display());
        return Ok(true);
    }

    println!("Records in {}:\n", ledger.path().display());
    for record in recent {
        println!(
            "  {} {:<8} {:<6} {:>3} {}  {}",
            status_icon(record.status),
            format!("{:?}", record.status).to_uppercase(),
            record.action,
            record.instances_affected,
            record.timestamp,
            record.execution_id
        );
        if let Some(message) = &record.error_message {
            println!("      {}", message);
        }
    }

    Ok(true)
}

fn status_icon(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Success => "✓",
        ExecutionStatus::Skipped => "-",
        ExecutionStatus::Failed | ExecutionStatus::Critical => "✗",
    }
}
