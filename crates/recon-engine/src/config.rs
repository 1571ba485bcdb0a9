//! Configuration for recon-engine.
//!
//! Supports loading from a TOML file with environment variable and CLI
//! overrides. Defaults are sensible for a local bot on the default port.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use recon_common::DataMode;

use crate::api::PairScope;
use crate::poller::PollerConfig;
use crate::server::ApiServerConfig;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct ReconConfig {
    /// Data partition: live or test.
    pub mode: DataMode,

    /// Symbol traded on the L venue.
    pub symbol_l: String,

    /// Symbol traded on the E venue.
    pub symbol_e: String,

    /// Logging level.
    pub log_level: String,

    /// Bot API connection.
    pub bot_api: BotApiConfig,

    /// Polling cadence and limits.
    pub poll: PollConfig,

    /// Read API server.
    pub server: ServerConfig,
}

/// Bot API connection parameters.
#[derive(Debug, Clone)]
pub struct BotApiConfig {
    /// Base URL of the bot's HTTP API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Polling parameters.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Tick interval in milliseconds. The dashboard refreshes on a
    /// 4-6 s cadence.
    pub interval_ms: u64,
    /// Row limit for the pair endpoints.
    pub limit: u32,
}

/// Read API server parameters.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            mode: DataMode::Live,
            symbol_l: "BTCUSDT".to_string(),
            symbol_e: "BTC-USD".to_string(),
            log_level: "info".to_string(),
            bot_api: BotApiConfig {
                base_url: "http://127.0.0.1:8899".to_string(),
                timeout_secs: 10,
            },
            poll: PollConfig {
                interval_ms: 5_000,
                limit: 50,
            },
            server: ServerConfig {
                port: 3010,
                enable_cors: true,
            },
        }
    }
}

// Raw TOML shapes; every field optional so partial files work.

#[derive(Debug, Deserialize)]
struct RawConfig {
    mode: Option<String>,
    symbol_l: Option<String>,
    symbol_e: Option<String>,
    log_level: Option<String>,
    bot_api: Option<RawBotApi>,
    poll: Option<RawPoll>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawBotApi {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawPoll {
    interval_ms: Option<u64>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    port: Option<u16>,
    enable_cors: Option<bool>,
}

impl ReconConfig {
    /// Load configuration from a TOML file, layered over defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let raw: RawConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        let mut config = Self::default();

        if let Some(mode) = raw.mode {
            config.mode = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid mode in config")?;
        }
        if let Some(symbol_l) = raw.symbol_l {
            config.symbol_l = symbol_l;
        }
        if let Some(symbol_e) = raw.symbol_e {
            config.symbol_e = symbol_e;
        }
        if let Some(log_level) = raw.log_level {
            config.log_level = log_level;
        }
        if let Some(bot_api) = raw.bot_api {
            if let Some(base_url) = bot_api.base_url {
                config.bot_api.base_url = base_url;
            }
            if let Some(timeout_secs) = bot_api.timeout_secs {
                config.bot_api.timeout_secs = timeout_secs;
            }
        }
        if let Some(poll) = raw.poll {
            if let Some(interval_ms) = poll.interval_ms {
                config.poll.interval_ms = interval_ms;
            }
            if let Some(limit) = poll.limit {
                config.poll.limit = limit;
            }
        }
        if let Some(server) = raw.server {
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(enable_cors) = server.enable_cors {
                config.server.enable_cors = enable_cors;
            }
        }

        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("RECON_MODE") {
            if let Ok(parsed) = mode.parse() {
                self.mode = parsed;
            }
        }
        if let Ok(url) = std::env::var("RECON_BOT_API_URL") {
            if !url.is_empty() {
                self.bot_api.base_url = url;
            }
        }
        if let Ok(port) = std::env::var("RECON_API_PORT") {
            if let Ok(parsed) = port.parse() {
                self.server.port = parsed;
            }
        }
        if let Ok(level) = std::env::var("RECON_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
    }

    /// Apply CLI overrides.
    pub fn apply_cli_overrides(
        &mut self,
        mode: Option<DataMode>,
        bot_api_url: Option<String>,
        port: Option<u16>,
        symbol_l: Option<String>,
        symbol_e: Option<String>,
    ) {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(url) = bot_api_url {
            self.bot_api.base_url = url;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(symbol_l) = symbol_l {
            self.symbol_l = symbol_l;
        }
        if let Some(symbol_e) = symbol_e {
            self.symbol_e = symbol_e;
        }
    }

    /// Validate the assembled configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bot_api.base_url.trim().is_empty() {
            bail!("bot_api.base_url must not be empty");
        }
        if self.bot_api.timeout_secs == 0 {
            bail!("bot_api.timeout_secs must be positive");
        }
        if self.poll.interval_ms == 0 {
            bail!("poll.interval_ms must be positive");
        }
        if self.poll.limit == 0 {
            bail!("poll.limit must be positive");
        }
        if self.symbol_l.trim().is_empty() || self.symbol_e.trim().is_empty() {
            bail!("symbol_l and symbol_e must not be empty");
        }
        Ok(())
    }

    /// Scope for the pair endpoints.
    pub fn pair_scope(&self) -> PairScope {
        PairScope {
            symbol_l: self.symbol_l.clone(),
            symbol_e: self.symbol_e.clone(),
            mode: self.mode,
        }
    }

    /// Poller settings derived from this config.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poll.interval_ms),
            limit: self.poll.limit,
        }
    }

    /// API server settings derived from this config.
    pub fn api_server_config(&self) -> ApiServerConfig {
        ApiServerConfig {
            port: self.server.port,
            enable_cors: self.server.enable_cors,
        }
    }

    /// Bot API request timeout.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.bot_api.timeout_secs)
    }
}
