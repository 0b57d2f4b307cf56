//! Upstream post sources.
//!
//! A [`PostSource`] answers the three listing queries. Two implementations
//! exist: [`PublicSource`] reads the unauthenticated `.json` endpoints and
//! [`AuthenticatedSource`] goes through the OAuth API, which also reports
//! `stickied` and `locked`. [`build_source`] picks one from configuration.

mod authenticated;
mod http;
mod public;

pub use authenticated::AuthenticatedSource;
pub use public::PublicSource;

use crate::config::RedditConfig;
use crate::error::FetchResult;
use crate::types::{Post, SearchQuery, SubredditQuery, UserQuery};
use std::sync::Arc;

/// Read access to Reddit posts
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    /// Which strategy backs this source
    fn kind(&self) -> PostSourceKind;

    /// One page of a subreddit listing
    async fn subreddit_posts(&self, query: &SubredditQuery) -> FetchResult<Vec<Post>>;

    /// One page of site-wide search results
    async fn search(&self, query: &SearchQuery) -> FetchResult<Vec<Post>>;

    /// One page of a user's submissions
    async fn user_posts(&self, query: &UserQuery) -> FetchResult<Vec<Post>>;
}

/// Fetch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSourceKind {
    Public,
    Authenticated,
}

impl PostSourceKind {
    /// Authenticated when a full credential pair is configured.
    pub fn from_config(config: &RedditConfig) -> Self {
        if config.credentials().is_some() {
            Self::Authenticated
        } else {
            Self::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for PostSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the source selected by `config`.
pub fn build_source(config: &RedditConfig) -> FetchResult<Arc<dyn PostSource>> {
    if config.has_partial_credentials() {
        tracing::warn!(
            "Only one of client id / client secret is configured, using public endpoints"
        );
    }

    match (PostSourceKind::from_config(config), config.credentials()) {
        (PostSourceKind::Authenticated, Some(credentials)) => {
            tracing::info!("Using authenticated Reddit API");
            Ok(Arc::new(AuthenticatedSource::new(config, credentials)?))
        }
        _ => {
            tracing::info!("Using public Reddit JSON endpoints");
            Ok(Arc::new(PublicSource::new(config)?))
        }
    }
}
