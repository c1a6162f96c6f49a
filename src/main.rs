//! MCP server binary entry point.

use anyhow::{Context, Result};
use dbcatalog_mcp::{
    config::ServerConfig,
    protocol::McpServerBuilder,
    server::{McpHandler, ServerStateBuilder},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = ServerConfig::builder()
        .from_env()?
        .build()
        .context("Invalid server configuration")?;

    let state = Arc::new(
        ServerStateBuilder::new()
            .config(config)
            .build()
            .context("Failed to load the catalog")?,
    );

    let context = state.invoker.context();
    info!(
        tools = state.registry().len(),
        tables = context.catalog().table_count(),
        routines = context.catalog().routine_count(),
        sampling = context.has_connection(),
        "Server state initialized"
    );

    let server = McpServerBuilder::new()
        .handler(McpHandler::new(state))
        .name(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .build()?;

    info!("MCP server ready, waiting for requests on stdin");
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dbcatalog_mcp=info,warn"));

    // Stdout carries the protocol, so logs go to stderr as JSON lines.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}
