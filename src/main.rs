//! LexGuard - Unauthorized-practice-of-law screening for AI-generated legal text
//!
//! Runs the compliance API server, or screens and sanitizes content from
//! the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexguard::{
    api::build_app,
    compliance::{ComplianceEngine, ContentType},
    config::LexGuardConfig,
    llm::{HttpReasoningModel, ReasoningModel, UnavailableModel},
    sanitizer::SanitizationLevel,
};
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lexguard")]
#[command(author = "LexGuard Team")]
#[command(version)]
#[command(about = "Unauthorized-practice-of-law screening for AI-generated legal text")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LEXGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Text given inline, from a file, or on stdin
#[derive(clap::Args)]
struct Input {
    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Text to process (stdin when neither this nor --file is given)
    text: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the compliance API server
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a full compliance check
    Check {
        /// Content type: contract, legal_qa, template or general
        #[arg(short = 't', long, default_value = "general")]
        content_type: String,

        #[command(flatten)]
        input: Input,
    },

    /// Sanitize content without a compliance decision
    Sanitize {
        /// Content type: contract, legal_qa, template or general
        #[arg(short = 't', long, default_value = "general")]
        content_type: String,

        /// minimal, moderate or comprehensive (configured level when omitted)
        #[arg(short, long)]
        level: Option<SanitizationLevel>,

        /// Use the contract-template variant
        #[arg(long)]
        contract: bool,

        #[command(flatten)]
        input: Input,
    },

    /// Re-check already sanitized content
    Validate {
        #[command(flatten)]
        input: Input,
    },

    /// Show compliance flags and status
    Status,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = match &cli.config {
        Some(path) => LexGuardConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => LexGuardConfig::default(),
    };

    match cli.command {
        Commands::Serve { host, port } => run_server(config, host, port).await?,
        Commands::Check { content_type, input } => {
            let engine = build_engine(&config).await?;
            let result = engine
                .check(&input.read()?, ContentType::parse_lossy(&content_type))
                .await;
            print_json(&result)?;
            if !result.is_compliant {
                std::process::exit(2);
            }
        }
        Commands::Sanitize {
            content_type,
            level,
            contract,
            input,
        } => {
            let engine = build_engine(&config).await?;
            let text = input.read()?;
            let result = if contract {
                engine.sanitize_contract(&text, level).await
            } else {
                engine
                    .sanitize(&text, ContentType::parse_lossy(&content_type), level)
                    .await
            };
            print_json(&result)?;
        }
        Commands::Validate { input } => {
            let engine = build_engine(&config).await?;
            print_json(&engine.validate(&input.read()?))?;
        }
        Commands::Status => {
            let engine = build_engine(&config).await?;
            print_json(&engine.status().await)?;
        }
        Commands::Config { default } => {
            let shown = if default {
                LexGuardConfig::default()
            } else {
                config
            };
            println!("{}", toml::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lexguard={},tower_http={}", log_level, log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output stays machine-readable.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Resolve the reasoning model. Without credentials the engine still runs,
/// but every semantic review fails closed.
fn build_model(config: &LexGuardConfig) -> Arc<dyn ReasoningModel> {
    match HttpReasoningModel::from_config(&config.model) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::warn!(error = %e, "Reasoning model unavailable, semantic analysis will fail closed");
            Arc::new(UnavailableModel::new(e.to_string()))
        }
    }
}

async fn build_engine(config: &LexGuardConfig) -> Result<ComplianceEngine> {
    let engine = ComplianceEngine::from_config(config, build_model(config))
        .await
        .context("Failed to initialize compliance engine")?;
    Ok(engine)
}

async fn run_server(mut config: LexGuardConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = Arc::new(build_engine(&config).await?);
    let app = build_app(engine, &config.server.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    tracing::info!(%addr, "LexGuard compliance API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down...");
    Ok(())
}

impl Input {
    fn read(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
