//! Mantle ecosystem QA agent
//!
//! Entry point for the HTTP service and the interactive CLI.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mantle_agent::config::{AppConfig, Cli, Command, load_llm_settings, load_tool_settings};
use mantle_agent::llm::{Orchestrator, ReasoningEngine};
use mantle_agent::session::SessionRegistry;
use mantle_agent::storage::{SessionStorage, SqliteStorage};
use mantle_agent::tools::web3::{
    GetBalanceTool, GetBlockTool, GetTransactionTool, LatestBlockNumberTool, Web3Client,
};
use mantle_agent::tools::{CrawlTool, SearchTool, ToolRegistry};
use mantle_agent::{AppState, cli, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let args = Cli::parse();
    let config = Arc::new(AppConfig::load(&args)?);

    // Load LLM settings
    let settings = match load_llm_settings() {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    // Tool set: web search, page fetch, on-chain queries
    let tool_settings = load_tool_settings();
    let web3 = Arc::new(Web3Client::new(
        tool_settings.web3_provider_url.clone(),
        tool_settings.native_symbol.clone(),
    ));
    let tools = Arc::new(
        ToolRegistry::new()
            .with_tool(Arc::new(SearchTool::new(
                tool_settings.tavily_api_key.clone(),
                config.agent.search_max_results,
            )))
            .with_tool(Arc::new(CrawlTool::default()))
            .with_tool(Arc::new(GetBalanceTool::new(Arc::clone(&web3))))
            .with_tool(Arc::new(GetTransactionTool::new(Arc::clone(&web3))))
            .with_tool(Arc::new(GetBlockTool::new(Arc::clone(&web3))))
            .with_tool(Arc::new(LatestBlockNumberTool::new(Arc::clone(&web3)))),
    );

    for name in tools.names() {
        info!(name: "tool.registered", tool = %name, "Tool registered");
    }

    // Reasoning engine bound to the persona and tool set
    let engine: Arc<dyn ReasoningEngine> = Arc::new(
        Orchestrator::new(settings, tools).with_show_tool_calls(config.agent.show_tool_calls),
    );

    // Session persistence + registry
    let storage: Arc<dyn SessionStorage> = Arc::new(SqliteStorage::open(&config.storage.db_path)?);
    let registry = Arc::new(SessionRegistry::new(engine, storage));

    match args.command {
        Some(Command::Chat) => cli::run(registry).await,
        Some(Command::Serve) | None => {
            let state = AppState { registry };
            server::start_server(config, state).await
        }
    }
}
