// Unauthenticated reads against the public `.json` listings

use super::http::{build_client, endpoint, send_json};
use super::{PostSource, PostSourceKind};
use crate::config::RedditConfig;
use crate::error::FetchResult;
use crate::normalize::{normalize_listing, PostShape};
use crate::types::{Post, SearchQuery, SortOrder, SubredditQuery, UserQuery};
use reqwest::Client;
use url::Url;

/// Source backed by `www.reddit.com/*.json`, no credentials
pub struct PublicSource {
    client: Client,
    api_base: String,
    permalink_base: String,
    timeout_secs: u64,
}

impl PublicSource {
    pub fn new(config: &RedditConfig) -> FetchResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            api_base: config.api_base.clone(),
            permalink_base: config.permalink_base.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn fetch(&self, url: Url) -> FetchResult<Vec<Post>> {
        tracing::debug!(url = %url, "GET public listing");
        let body = send_json(self.client.get(url), self.timeout_secs).await?;
        Ok(normalize_listing(&body, &self.permalink_base, PostShape::Basic))
    }
}

#[async_trait::async_trait]
impl PostSource for PublicSource {
    fn kind(&self) -> PostSourceKind {
        PostSourceKind::Public
    }

    async fn subreddit_posts(&self, query: &SubredditQuery) -> FetchResult<Vec<Post>> {
        // No time window control here; the sort token is passed straight through
        let listing = format!("{}.json", query.sort.as_str());
        let mut url = endpoint(&self.api_base, &["r", &query.subreddit, &listing])?;
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string());
        self.fetch(url).await
    }

    async fn search(&self, query: &SearchQuery) -> FetchResult<Vec<Post>> {
        let mut url = endpoint(&self.api_base, &["search.json"])?;
        url.query_pairs_mut()
            .append_pair("q", &query.query)
            .append_pair("limit", &query.limit.to_string())
            .append_pair("sort", query.sort.as_str());
        self.fetch(url).await
    }

    async fn user_posts(&self, query: &UserQuery) -> FetchResult<Vec<Post>> {
        let mut url = endpoint(&self.api_base, &["u", &query.username, "submitted.json"])?;
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("sort", query.sort.as_str());
        self.fetch(url).await
    }
}
