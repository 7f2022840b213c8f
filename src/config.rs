use crate::llm::{LlmSettings, Provider};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mantle ecosystem QA agent", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Session database path
    #[arg(long, env = "MANTLE_DB_PATH")]
    pub db_path: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Interactive question loop on a fixed session
    Chat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub show_tool_calls: bool,
    pub search_max_results: usize,
}

impl AppConfig {
    /// Layered load: defaults, then an optional YAML file, then `MANTLE_`
    /// prefixed environment variables, then explicit CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.db_path", "mantle_agent_workflows.db")?
            .set_default("agent.show_tool_calls", true)?
            .set_default("agent.search_max_results", 3)?;

        // Config file: explicit path is required to exist, the cwd fallback
        // is not.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // Environment variables, e.g. MANTLE_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("MANTLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their clap env fallbacks) win.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(db_path) = &cli.db_path {
            builder = builder.set_override("storage.db_path", db_path.clone())?;
        }

        builder.build()?.try_deserialize()
    }
}

pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let base_url = env::var("LLM_BASE_URL")
        .map_err(|_| "Missing required env var: LLM_BASE_URL".to_string())?;
    if base_url.trim().is_empty() {
        return Err("LLM_BASE_URL cannot be empty".to_string());
    }

    let model =
        env::var("LLM_MODEL").map_err(|_| "Missing required env var: LLM_MODEL".to_string())?;
    if model.trim().is_empty() {
        return Err("LLM_MODEL cannot be empty".to_string());
    }

    let api_key = env::var("LLM_API_KEY").ok().filter(|s| !s.trim().is_empty());

    // Auto-detect provider from base URL
    let provider = Provider::detect_from_url(&base_url);

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
    })
}

/// Connection settings for the retrieval and on-chain tool adapters.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Tavily API key; search degrades to an unconfigured message without it.
    pub tavily_api_key: Option<String>,
    /// JSON-RPC endpoint for on-chain queries.
    pub web3_provider_url: String,
    /// Native unit symbol used when formatting amounts.
    pub native_symbol: String,
}

pub fn load_tool_settings() -> ToolSettings {
    let tavily_api_key = env::var("TAVILY_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let web3_provider_url = env::var("WEB3_PROVIDER_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://rpc.mantle.xyz".to_string());

    let native_symbol = env::var("MANTLE_NATIVE_SYMBOL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "MNT".to_string());

    ToolSettings {
        tavily_api_key,
        web3_provider_url,
        native_symbol,
    }
}
