// In-memory post source for dispatcher and tool tests

use reddit_mcp_core::{
    FetchError, FetchResult, Post, PostSource, PostSourceKind, SearchQuery, SortOrder,
    SubredditQuery, UserQuery,
};
use std::sync::Mutex;

pub(crate) enum FakeBehavior {
    Posts(Vec<Post>),
    Timeout,
    Status(u16),
    Malformed,
    Panic,
}

/// Records every query it receives as `"<op> <arg> <limit> <sort>"`
pub(crate) struct FakeSource {
    behavior: FakeBehavior,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_posts(posts: Vec<Post>) -> Self {
        Self::new(FakeBehavior::Posts(posts))
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: String) -> FetchResult<Vec<Post>> {
        self.calls.lock().unwrap().push(call);
        match &self.behavior {
            FakeBehavior::Posts(posts) => Ok(posts.clone()),
            FakeBehavior::Timeout => Err(FetchError::Timeout(10)),
            FakeBehavior::Status(status) => Err(FetchError::from_status(*status, "blocked")),
            FakeBehavior::Malformed => Err(FetchError::Decode("expected value".to_string())),
            FakeBehavior::Panic => panic!("fake source exploded"),
        }
    }
}

#[async_trait::async_trait]
impl PostSource for FakeSource {
    fn kind(&self) -> PostSourceKind {
        PostSourceKind::Public
    }

    async fn subreddit_posts(&self, query: &SubredditQuery) -> FetchResult<Vec<Post>> {
        self.respond(format!(
            "subreddit {} {} {}",
            query.subreddit,
            query.limit,
            query.sort.as_str()
        ))
    }

    async fn search(&self, query: &SearchQuery) -> FetchResult<Vec<Post>> {
        self.respond(format!(
            "search {} {} {}",
            query.query,
            query.limit,
            query.sort.as_str()
        ))
    }

    async fn user_posts(&self, query: &UserQuery) -> FetchResult<Vec<Post>> {
        self.respond(format!(
            "user {} {} {}",
            query.username,
            query.limit,
            query.sort.as_str()
        ))
    }
}

pub(crate) fn sample_post(title: &str) -> Post {
    Post {
        title: title.to_string(),
        author: "ferris".to_string(),
        score: 42,
        upvote_ratio: 0.9,
        num_comments: 7,
        url: "https://example.com/article".to_string(),
        permalink: "https://reddit.com/r/rust/comments/1/post/".to_string(),
        created_utc: 1700000000.0,
        selftext: String::new(),
        subreddit: "rust".to_string(),
        is_self: false,
        over_18: false,
        stickied: None,
        locked: None,
    }
}
