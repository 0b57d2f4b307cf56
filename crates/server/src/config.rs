use anyhow::{Context, Result};
use reddit_mcp::{register_reddit_tools, McpServer, ToolRegistry, SERVER_NAME};
use reddit_mcp_core::{build_source, PostSourceKind, RedditConfig};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub reddit: RedditConfig,
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let reddit = RedditConfig::load(config_path)?;
        tracing::info!(
            strategy = %PostSourceKind::from_config(&reddit),
            user_agent = %reddit.user_agent,
            "Loaded Reddit configuration"
        );
        Ok(Self { reddit })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub mcp: Arc<McpServer>,
    pub server_name: String,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let source = build_source(&config.reddit).context("Failed to create Reddit client")?;

        let mut registry = ToolRegistry::new();
        register_reddit_tools(&mut registry, source);
        tracing::info!("Registered {} tools", registry.len());

        Ok(Self {
            mcp: Arc::new(McpServer::new(registry)),
            server_name: SERVER_NAME.to_string(),
        })
    }
}
