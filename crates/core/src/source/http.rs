// Shared HTTP plumbing for both sources

use crate::config::RedditConfig;
use crate::error::{FetchError, FetchResult};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use url::Url;

/// Client carrying the configured user agent and timeout.
pub(crate) fn build_client(config: &RedditConfig) -> FetchResult<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .build()
        .map_err(FetchError::Http)
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> FetchResult<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a request and decode the JSON body.
///
/// Non-2xx statuses and unparseable bodies become errors; the response is
/// dropped on every path so the connection is released.
pub(crate) async fn send_json(request: RequestBuilder, timeout_secs: u64) -> FetchResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(e, timeout_secs))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(e, timeout_secs))?;

    if !status.is_success() {
        return Err(FetchError::from_status(status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body)?)
}
