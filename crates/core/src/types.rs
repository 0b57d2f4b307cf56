use serde::{Deserialize, Serialize};

/// Author value used when the upstream record has no author (deleted account)
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Default number of posts returned when the caller gives no limit
pub const DEFAULT_LIMIT: u32 = 10;

/// Smallest number of posts a fetch will request
pub const MIN_LIMIT: u32 = 1;

/// Hard ceiling imposed by the upstream service
pub const MAX_LIMIT: u32 = 25;

/// A normalized Reddit post, identical in shape across all tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub author: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub url: String,
    pub permalink: String,
    pub created_utc: f64,
    pub selftext: String,
    pub subreddit: String,
    pub is_self: bool,
    pub over_18: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// Clamp a requested result count into `[MIN_LIMIT, MAX_LIMIT]`.
///
/// A missing limit yields `DEFAULT_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> u32 {
    match requested {
        Some(n) => n.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}

/// A closed set of sort tokens accepted by one upstream listing
pub trait SortOrder: Copy + Default + Sized {
    /// Every accepted token, default first
    const TOKENS: &'static [&'static str];

    fn from_token(token: &str) -> Option<Self>;

    fn as_str(&self) -> &'static str;

    /// Parse a caller-supplied token, falling back to the default for
    /// anything outside the accepted set.
    fn parse_or_default(token: Option<&str>) -> Self {
        token.and_then(Self::from_token).unwrap_or_default()
    }
}

/// Sort orders for a subreddit listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubredditSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl SortOrder for SubredditSort {
    const TOKENS: &'static [&'static str] = &["hot", "new", "top", "rising"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "hot" => Some(Self::Hot),
            "new" => Some(Self::New),
            "top" => Some(Self::Top),
            "rising" => Some(Self::Rising),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
            Self::Rising => "rising",
        }
    }
}

/// Sort orders for site-wide search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    #[default]
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SortOrder for SearchSort {
    const TOKENS: &'static [&'static str] = &["relevance", "hot", "top", "new", "comments"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "relevance" => Some(Self::Relevance),
            "hot" => Some(Self::Hot),
            "top" => Some(Self::Top),
            "new" => Some(Self::New),
            "comments" => Some(Self::Comments),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Hot => "hot",
            Self::Top => "top",
            Self::New => "new",
            Self::Comments => "comments",
        }
    }
}

/// Sort orders for a user's submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSort {
    #[default]
    New,
    Hot,
    Top,
    Controversial,
}

impl SortOrder for UserSort {
    const TOKENS: &'static [&'static str] = &["new", "hot", "top", "controversial"];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "new" => Some(Self::New),
            "hot" => Some(Self::Hot),
            "top" => Some(Self::Top),
            "controversial" => Some(Self::Controversial),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Hot => "hot",
            Self::Top => "top",
            Self::Controversial => "controversial",
        }
    }
}

/// Listing request for one subreddit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubredditQuery {
    pub subreddit: String,
    pub limit: u32,
    pub sort: SubredditSort,
}

impl SubredditQuery {
    pub fn new(subreddit: &str, limit: Option<i64>, sort: Option<&str>) -> Self {
        Self {
            subreddit: strip_name_prefix(subreddit, &["/r/", "r/"]),
            limit: clamp_limit(limit),
            sort: SubredditSort::parse_or_default(sort),
        }
    }
}

/// Site-wide search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: u32,
    pub sort: SearchSort,
}

impl SearchQuery {
    pub fn new(query: &str, limit: Option<i64>, sort: Option<&str>) -> Self {
        Self {
            query: query.to_string(),
            limit: clamp_limit(limit),
            sort: SearchSort::parse_or_default(sort),
        }
    }
}

/// Submission listing request for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub username: String,
    pub limit: u32,
    pub sort: UserSort,
}

impl UserQuery {
    pub fn new(username: &str, limit: Option<i64>, sort: Option<&str>) -> Self {
        Self {
            username: strip_name_prefix(username, &["/u/", "u/"]),
            limit: clamp_limit(limit),
            sort: UserSort::parse_or_default(sort),
        }
    }
}

fn strip_name_prefix(name: &str, prefixes: &[&str]) -> String {
    let name = name.trim();
    prefixes
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
        .to_string()
}
