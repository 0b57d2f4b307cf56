// Reddit read tools: subreddit listing, search, user submissions

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_enum, json_schema_integer, json_schema_object, json_schema_string, Tool,
    ToolRegistry,
};
use anyhow::{Context, Result};
use reddit_mcp_core::{
    FetchResult, Post, PostSource, SearchQuery, SearchSort, SortOrder, SubredditQuery,
    SubredditSort, UserQuery, UserSort, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Register the three Reddit tools in listing order.
pub fn register_reddit_tools(registry: &mut ToolRegistry, source: Arc<dyn PostSource>) {
    registry.register(Arc::new(SubredditPostsTool::new(source.clone())));
    registry.register(Arc::new(SearchRedditTool::new(source.clone())));
    registry.register(Arc::new(UserPostsTool::new(source)));
}

/// Shared optional arguments. Both are read leniently: anything unusable
/// falls back to the tool's default instead of failing the call.
#[derive(Debug, Default, Deserialize)]
struct ListingArgs {
    #[serde(default)]
    limit: Option<Value>,
    #[serde(default)]
    sort: Option<Value>,
}

impl ListingArgs {
    fn limit(&self) -> Option<i64> {
        match self.limit.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn sort(&self) -> Option<&str> {
        self.sort.as_ref().and_then(Value::as_str)
    }
}

fn object_arguments(arguments: Value) -> Value {
    if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    }
}

fn limit_schema(noun: &str) -> Value {
    json_schema_integer(
        &format!("Number of {} to return ({}-{})", noun, MIN_LIMIT, MAX_LIMIT),
        MIN_LIMIT as i64,
        MAX_LIMIT as i64,
        DEFAULT_LIMIT as i64,
    )
}

fn sort_schema<S: SortOrder>() -> Value {
    json_schema_enum("Sort order", S::TOKENS, S::default().as_str())
}

/// Render a fetch outcome as tool output: a JSON array of posts, or an
/// `{"error": ...}` object flagged as a tool error.
fn posts_result(tool: &str, outcome: FetchResult<Vec<Post>>) -> Result<CallToolResult> {
    match outcome {
        Ok(posts) => {
            tracing::info!(tool, count = posts.len(), "Tool call succeeded");
            Ok(CallToolResult::text(serde_json::to_string_pretty(&posts)?))
        }
        Err(e) => {
            tracing::warn!(tool, error = %e, "Upstream fetch failed");
            let message = if e.is_transport() {
                format!("Request failed: {}", e)
            } else {
                format!("Unexpected error: {}", e)
            };
            let body = serde_json::json!({ "error": message });
            Ok(CallToolResult::error_text(serde_json::to_string_pretty(&body)?))
        }
    }
}

/// `get_subreddit_posts`
pub struct SubredditPostsTool {
    source: Arc<dyn PostSource>,
}

impl SubredditPostsTool {
    pub const NAME: &'static str = "get_subreddit_posts";

    pub fn new(source: Arc<dyn PostSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, Deserialize)]
struct SubredditArgs {
    subreddit: String,
    #[serde(flatten)]
    listing: ListingArgs,
}

#[async_trait::async_trait]
impl Tool for SubredditPostsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.to_string(),
            description: "Get top posts from any subreddit".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "subreddit": json_schema_string("Subreddit name (without r/)"),
                    "limit": limit_schema("posts"),
                    "sort": sort_schema::<SubredditSort>()
                }),
                vec!["subreddit"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SubredditArgs = serde_json::from_value(object_arguments(arguments))
            .context("Invalid arguments for get_subreddit_posts")?;

        let query = SubredditQuery::new(&args.subreddit, args.listing.limit(), args.listing.sort());
        tracing::info!(
            subreddit = %query.subreddit,
            limit = query.limit,
            sort = query.sort.as_str(),
            "Fetching subreddit posts"
        );

        posts_result(Self::NAME, self.source.subreddit_posts(&query).await)
    }
}

/// `search_reddit`
pub struct SearchRedditTool {
    source: Arc<dyn PostSource>,
}

impl SearchRedditTool {
    pub const NAME: &'static str = "search_reddit";

    pub fn new(source: Arc<dyn PostSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(flatten)]
    listing: ListingArgs,
}

#[async_trait::async_trait]
impl Tool for SearchRedditTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.to_string(),
            description: "Search all of Reddit".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Search query string"),
                    "limit": limit_schema("results"),
                    "sort": sort_schema::<SearchSort>()
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SearchArgs = serde_json::from_value(object_arguments(arguments))
            .context("Invalid arguments for search_reddit")?;

        let query = SearchQuery::new(&args.query, args.listing.limit(), args.listing.sort());
        tracing::info!(
            query = %query.query,
            limit = query.limit,
            sort = query.sort.as_str(),
            "Searching Reddit"
        );

        posts_result(Self::NAME, self.source.search(&query).await)
    }
}

/// `get_user_posts`
pub struct UserPostsTool {
    source: Arc<dyn PostSource>,
}

impl UserPostsTool {
    pub const NAME: &'static str = "get_user_posts";

    pub fn new(source: Arc<dyn PostSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, Deserialize)]
struct UserArgs {
    username: String,
    #[serde(flatten)]
    listing: ListingArgs,
}

#[async_trait::async_trait]
impl Tool for UserPostsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.to_string(),
            description: "Get posts from a specific Reddit user".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "username": json_schema_string("Reddit username (without u/)"),
                    "limit": limit_schema("posts"),
                    "sort": sort_schema::<UserSort>()
                }),
                vec!["username"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: UserArgs = serde_json::from_value(object_arguments(arguments))
            .context("Invalid arguments for get_user_posts")?;

        let query = UserQuery::new(&args.username, args.listing.limit(), args.listing.sort());
        tracing::info!(
            username = %query.username,
            limit = query.limit,
            sort = query.sort.as_str(),
            "Fetching user posts"
        );

        posts_result(Self::NAME, self.source.user_posts(&query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_post, FakeBehavior, FakeSource};
    use serde_json::json;

    fn output(result: &CallToolResult) -> Value {
        serde_json::from_str(result.content[0].as_text()).unwrap()
    }

    #[tokio::test]
    async fn test_subreddit_posts_success() {
        let source = Arc::new(FakeSource::with_posts(vec![
            sample_post("first"),
            sample_post("second"),
        ]));
        let tool = SubredditPostsTool::new(source.clone());

        let result = tool
            .execute(json!({"subreddit": "rust", "limit": 3}))
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        let posts = output(&result);
        assert_eq!(posts.as_array().unwrap().len(), 2);
        assert_eq!(posts[0]["title"], "first");
        assert_eq!(source.calls(), vec!["subreddit rust 3 hot"]);
    }

    #[tokio::test]
    async fn test_limit_clamped_and_sort_defaulted() {
        let source = Arc::new(FakeSource::with_posts(vec![]));

        SubredditPostsTool::new(source.clone())
            .execute(json!({"subreddit": "rust", "limit": 500, "sort": "best"}))
            .await
            .unwrap();
        SearchRedditTool::new(source.clone())
            .execute(json!({"query": "tokio", "limit": -3, "sort": "sideways"}))
            .await
            .unwrap();
        UserPostsTool::new(source.clone())
            .execute(json!({"username": "spez", "sort": 5}))
            .await
            .unwrap();

        assert_eq!(
            source.calls(),
            vec![
                "subreddit rust 25 hot",
                "search tokio 1 relevance",
                "user spez 10 new",
            ]
        );
    }

    #[tokio::test]
    async fn test_lenient_limit_values() {
        let source = Arc::new(FakeSource::with_posts(vec![]));
        let tool = UserPostsTool::new(source.clone());

        tool.execute(json!({"username": "a", "limit": 7.9})).await.unwrap();
        tool.execute(json!({"username": "b", "limit": "12"})).await.unwrap();
        tool.execute(json!({"username": "c", "limit": "many"})).await.unwrap();
        tool.execute(json!({"username": "d", "limit": null})).await.unwrap();

        assert_eq!(
            source.calls(),
            vec!["user a 7 new", "user b 12 new", "user c 10 new", "user d 10 new"]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_array() {
        let tool = SearchRedditTool::new(Arc::new(FakeSource::with_posts(vec![])));
        let result = tool.execute(json!({"query": "nothing"})).await.unwrap();

        assert_eq!(output(&result), json!([]));
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_tool_error() {
        let tool = SubredditPostsTool::new(Arc::new(FakeSource::new(FakeBehavior::Timeout)));
        let result = tool.execute(json!({"subreddit": "rust"})).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        let body = output(&result);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Request failed:"));
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_status_and_decode_failures() {
        let tool = UserPostsTool::new(Arc::new(FakeSource::new(FakeBehavior::Status(429))));
        let result = tool.execute(json!({"username": "spez"})).await.unwrap();
        assert!(output(&result)["error"].as_str().unwrap().contains("429"));

        let tool = SearchRedditTool::new(Arc::new(FakeSource::new(FakeBehavior::Malformed)));
        let result = tool.execute(json!({"query": "x"})).await.unwrap();
        assert!(output(&result)["error"]
            .as_str()
            .unwrap()
            .starts_with("Unexpected error:"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let tool = SubredditPostsTool::new(Arc::new(FakeSource::with_posts(vec![])));

        let err = tool.execute(json!({"limit": 5})).await.unwrap_err();
        assert!(err.to_string().contains("get_subreddit_posts"));

        assert!(tool.execute(Value::Null).await.is_err());
    }

    #[test]
    fn test_schemas_match_tools() {
        let source: Arc<dyn PostSource> = Arc::new(FakeSource::with_posts(vec![]));
        let mut registry = ToolRegistry::new();
        register_reddit_tools(&mut registry, source);

        let schemas = registry.list_schemas();
        let summary: Vec<(String, Value)> = schemas
            .iter()
            .map(|s| (s.name.clone(), s.input_schema["required"].clone()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("get_subreddit_posts".to_string(), json!(["subreddit"])),
                ("search_reddit".to_string(), json!(["query"])),
                ("get_user_posts".to_string(), json!(["username"])),
            ]
        );

        let subreddit = &schemas[0].input_schema["properties"];
        assert_eq!(subreddit["limit"]["minimum"], 1);
        assert_eq!(subreddit["limit"]["maximum"], 25);
        assert_eq!(subreddit["limit"]["default"], 10);
        assert_eq!(subreddit["sort"]["enum"], json!(["hot", "new", "top", "rising"]));
        assert_eq!(subreddit["sort"]["default"], "hot");

        let search = &schemas[1].input_schema["properties"];
        assert_eq!(
            search["sort"]["enum"],
            json!(["relevance", "hot", "top", "new", "comments"])
        );

        let user = &schemas[2].input_schema["properties"];
        assert_eq!(user["sort"]["enum"], json!(["new", "hot", "top", "controversial"]));
        assert_eq!(user["sort"]["default"], "new");
    }
}
