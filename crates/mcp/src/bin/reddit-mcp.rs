// Standalone MCP server binary (stdio transport)

use anyhow::{Context, Result};
use reddit_mcp::server::McpServer;
use reddit_mcp::tools::*;
use reddit_mcp::transport::serve_stdio;
use reddit_mcp_core::{build_source, RedditConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Reddit MCP Server starting...");

    let config_path = std::env::var("REDDIT_MCP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("reddit-mcp.toml"));
    let config = RedditConfig::load(&config_path)?;

    let source = build_source(&config).context("Failed to create Reddit client")?;

    let mut registry = ToolRegistry::new();
    register_reddit_tools(&mut registry, source);

    tracing::info!("Registered {} tools", registry.len());

    let server = Arc::new(McpServer::new(registry));
    serve_stdio(server).await?;

    Ok(())
}
