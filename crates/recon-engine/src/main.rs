//! recon-engine: trade reconciliation service for cross-venue arbitrage
//! review.
//!
//! Usage:
//!   recon-engine [OPTIONS]
//!
//! Options:
//!   -m, --mode <MODE>        Data partition: live, test
//!   -c, --config <FILE>      Config file path (default: config/recon.toml)
//!   --bot-api-url <URL>      Bot API base URL (overrides config)
//!   --port <PORT>            Read API port (overrides config)
//!   --symbol-l <SYMBOL>      L-venue symbol (overrides config)
//!   --symbol-e <SYMBOL>      E-venue symbol (overrides config)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use recon_common::DataMode;
use recon_engine::api::BotApiClient;
use recon_engine::config::ReconConfig;
use recon_engine::poller::{BotRowSource, Poller};
use recon_engine::server::{spawn_api_server, ServerState};

/// CLI arguments for recon-engine.
#[derive(Parser, Debug)]
#[command(name = "recon-engine")]
#[command(about = "Trade reconciliation service for cross-venue arbitrage review")]
#[command(version)]
struct Args {
    /// Data partition: live, test
    #[arg(short, long)]
    mode: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = "config/recon.toml")]
    config: PathBuf,

    /// Bot API base URL (overrides config file)
    #[arg(long)]
    bot_api_url: Option<String>,

    /// Read API port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// L-venue symbol (overrides config file)
    #[arg(long)]
    symbol_l: Option<String>,

    /// E-venue symbol (overrides config file)
    #[arg(long)]
    symbol_e: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args = Args::parse();

    // Load configuration
    let mut config = if args.config.exists() {
        ReconConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        warn!("Config file not found at {:?}, using defaults", args.config);
        ReconConfig::default()
    };

    config.apply_env_overrides();

    let cli_mode = match args.mode {
        Some(raw) => Some(
            raw.parse::<DataMode>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Invalid --mode")?,
        ),
        None => None,
    };
    config.apply_cli_overrides(
        cli_mode,
        args.bot_api_url,
        args.port,
        args.symbol_l,
        args.symbol_e,
    );
    config.validate()?;

    // Initialize logging
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        mode = %config.mode,
        symbol_l = %config.symbol_l,
        symbol_e = %config.symbol_e,
        bot_api = %config.bot_api.base_url,
        "Starting recon-engine"
    );

    // Wire up: bot API -> poller -> snapshot store -> read API.
    let client = BotApiClient::with_timeout(config.bot_api.base_url.clone(), config.api_timeout());
    let source = BotRowSource::new(client, config.pair_scope());
    let poller = Poller::new(source, config.poller_config());

    let state = ServerState::new(poller.store(), poller.limit_handle());
    let server = spawn_api_server(config.api_server_config(), state);

    tokio::select! {
        _ = poller.run() => {
            // The poller loop only exits if the runtime is shutting down.
            Ok(())
        }
        result = server => {
            result.context("API server task panicked")?
        }
    }
}
