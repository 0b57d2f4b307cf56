// Reads through the OAuth API using the client-credentials grant

use super::http::{build_client, endpoint, send_json};
use super::{PostSource, PostSourceKind};
use crate::config::{Credentials, RedditConfig};
use crate::error::{FetchError, FetchResult};
use crate::normalize::{normalize_listing, PostShape};
use crate::types::{Post, SearchQuery, SortOrder, SubredditQuery, SubredditSort, UserQuery};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Time window applied to `top` subreddit listings
const TOP_TIME_WINDOW: &str = "day";

/// Source backed by `oauth.reddit.com`.
///
/// Each call acquires a fresh application token, then issues the query.
pub struct AuthenticatedSource {
    client: Client,
    credentials: Credentials,
    oauth_base: String,
    token_url: String,
    permalink_base: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AuthenticatedSource {
    pub fn new(config: &RedditConfig, credentials: Credentials) -> FetchResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            credentials,
            oauth_base: config.oauth_base.clone(),
            token_url: config.token_url.clone(),
            permalink_base: config.permalink_base.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn access_token(&self) -> FetchResult<String> {
        let request = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")]);

        let body = match send_json(request, self.timeout_secs).await {
            Ok(body) => body,
            Err(FetchError::Status { status, body }) => {
                return Err(FetchError::Auth(format!(
                    "token endpoint returned status {}: {}",
                    status, body
                )));
            }
            Err(e) => return Err(e),
        };

        let token: TokenResponse = serde_json::from_value(body)?;
        match (token.access_token, token.error) {
            (Some(access_token), _) if !access_token.is_empty() => Ok(access_token),
            (_, Some(error)) => Err(FetchError::Auth(error)),
            _ => Err(FetchError::Auth("no access token in response".to_string())),
        }
    }

    async fn fetch(&self, mut url: Url) -> FetchResult<Vec<Post>> {
        let token = self.access_token().await?;

        url.query_pairs_mut().append_pair("raw_json", "1");
        tracing::debug!(url = %url, "GET authenticated listing");

        let body = send_json(self.client.get(url).bearer_auth(token), self.timeout_secs).await?;
        Ok(normalize_listing(&body, &self.permalink_base, PostShape::Extended))
    }
}

#[async_trait::async_trait]
impl PostSource for AuthenticatedSource {
    fn kind(&self) -> PostSourceKind {
        PostSourceKind::Authenticated
    }

    async fn subreddit_posts(&self, query: &SubredditQuery) -> FetchResult<Vec<Post>> {
        let mut url = endpoint(&self.oauth_base, &["r", &query.subreddit, query.sort.as_str()])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            if query.sort == SubredditSort::Top {
                pairs.append_pair("t", TOP_TIME_WINDOW);
            }
        }
        self.fetch(url).await
    }

    async fn search(&self, query: &SearchQuery) -> FetchResult<Vec<Post>> {
        let mut url = endpoint(&self.oauth_base, &["search"])?;
        url.query_pairs_mut()
            .append_pair("q", &query.query)
            .append_pair("limit", &query.limit.to_string())
            .append_pair("sort", query.sort.as_str());
        self.fetch(url).await
    }

    async fn user_posts(&self, query: &UserQuery) -> FetchResult<Vec<Post>> {
        let mut url = endpoint(&self.oauth_base, &["user", &query.username, "submitted"])?;
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("sort", query.sort.as_str());
        self.fetch(url).await
    }
}
