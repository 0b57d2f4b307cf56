use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

/// Upstream access configuration, read once at startup
#[derive(Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Host serving the public `.json` listings
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Host serving the authenticated API
    #[serde(default = "default_oauth_base")]
    pub oauth_base: String,

    /// Token endpoint for the client-credentials grant
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Prefix joined with each post's relative permalink
    #[serde(default = "default_permalink_base")]
    pub permalink_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("api_base", &self.api_base)
            .field("oauth_base", &self.oauth_base)
            .field("token_url", &self.token_url)
            .field("permalink_base", &self.permalink_base)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Client id and secret for the authenticated API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

fn default_api_base() -> String {
    "https://www.reddit.com".to_string()
}

fn default_oauth_base() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_token_url() -> String {
    "https://www.reddit.com/api/v1/access_token".to_string()
}

fn default_permalink_base() -> String {
    "https://reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("reddit-mcp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            oauth_base: default_oauth_base(),
            token_url: default_token_url(),
            permalink_base: default_permalink_base(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            client_id: None,
            client_secret: None,
        }
    }
}

impl RedditConfig {
    /// Load from a TOML file if it exists, then apply environment overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                config_path.display()
            );
            Self::default()
        };

        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Overlay credentials and user agent from a variable lookup.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = Some(client_id);
        }
        if let Some(client_secret) = lookup(ENV_CLIENT_SECRET) {
            self.client_secret = Some(client_secret);
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT).filter(|ua| !ua.trim().is_empty()) {
            self.user_agent = user_agent;
        }
        self
    }

    /// Both halves of the credential pair, if configured and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        let client_id = self.client_id.as_deref().map(str::trim).unwrap_or_default();
        let client_secret = self
            .client_secret
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// True when exactly one of id/secret is set.
    pub fn has_partial_credentials(&self) -> bool {
        let has_id = self.client_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_secret = self
            .client_secret
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        has_id != has_secret
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
