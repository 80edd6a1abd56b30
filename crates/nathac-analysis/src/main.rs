//! NATHAC command-line analyzer
//!
//! Reads an analysis request as JSON and prints the analysis response.

use anyhow::{Context, Result};
use clap::Parser;
use nathac_analysis::{AnalysisService, AnalyzeRequest, AppConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "nathac-analyze", version, about = "Per-subject academic risk analysis")]
struct Cli {
    /// Request JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Provider to use, overriding the request's `model` field
    #[arg(short, long)]
    provider: Option<String>,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(
        timeout_secs = config.llm.timeout_secs,
        failure_policy = ?config.llm.failure_policy,
        history_scope = ?config.llm.history_scope,
        "Loaded configuration"
    );

    let mut request = read_request(&cli.input)?;
    if let Some(provider) = cli.provider {
        request.model = provider;
    }

    let service = AnalysisService::from_settings(config.llm);
    let response = service
        .analyze(&request)
        .await
        .context("Analysis could not be started")?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", output);

    Ok(())
}

fn read_request(input: &Path) -> Result<AnalyzeRequest> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request file {}", input.display()))?
    };

    serde_json::from_str(&raw).context("Invalid analysis request JSON")
}

/// Initialize tracing subscriber (logs go to stderr, stdout carries the response)
fn init_tracing(log_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("nathac_analysis={level},nathac_llm={level}", level = log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
