//! MCP Server Entry Point
//!
//! Loads settings, registers the built-in tool categories and serves them on
//! `127.0.0.1` until Ctrl-C.
//!
//! Environment Variables:
//! - MCP_SETTINGS_FILE: Optional TOML settings file
//! - SERVER_NAME / SERVER_VERSION: Reported in `initialize`
//! - PORT: Loopback port (default: 3000)
//! - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
//! - MCP_DEBUG: Enable debug logging
//! - RUST_LOG: Log filter, takes precedence over MCP_DEBUG

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use cocos_mcp_server::{McpServer, Settings, tools};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    let default_level = if settings.debug_log { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = tools::build_registry(&settings).context("Failed to register built-in tools")?;
    let server = McpServer::new(settings, registry);

    server.start().await.context("Failed to start MCP server")?;
    let settings = server.settings();
    tracing::info!(
        name = %settings.server_name,
        version = %settings.server_version,
        port = server.status().await.port,
        "MCP server ready"
    );

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    tracing::info!("shutting down");
    server.stop().await;
    Ok(())
}
