// Mapping of raw upstream post records into the fixed `Post` schema

use crate::types::{Post, DELETED_AUTHOR};
use serde_json::Value;

/// Which optional fields a source is able to populate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostShape {
    /// Public listing endpoints: core fields only
    Basic,
    /// Authenticated API: core fields plus `stickied` and `locked`
    Extended,
}

/// Normalize one raw post record.
///
/// Never fails: missing or mistyped fields fall back to empty text, zero,
/// or `false`. The output permalink is always `permalink_base` joined with
/// the record's relative `permalink`, regardless of its `url` field.
pub fn normalize_post(raw: &Value, permalink_base: &str, shape: PostShape) -> Post {
    let author = raw
        .get("author")
        .and_then(Value::as_str)
        .filter(|author| !author.is_empty())
        .unwrap_or(DELETED_AUTHOR)
        .to_string();

    let (stickied, locked) = match shape {
        PostShape::Basic => (None, None),
        PostShape::Extended => (Some(bool_field(raw, "stickied")), Some(bool_field(raw, "locked"))),
    };

    Post {
        title: text_field(raw, "title"),
        author,
        score: int_field(raw, "score"),
        upvote_ratio: float_field(raw, "upvote_ratio").clamp(0.0, 1.0),
        num_comments: int_field(raw, "num_comments").max(0) as u64,
        url: text_field(raw, "url"),
        permalink: join_permalink(permalink_base, &text_field(raw, "permalink")),
        created_utc: float_field(raw, "created_utc"),
        selftext: text_field(raw, "selftext"),
        subreddit: text_field(raw, "subreddit"),
        is_self: bool_field(raw, "is_self"),
        over_18: bool_field(raw, "over_18"),
        stickied,
        locked,
    }
}

/// Normalize every post in a listing body (`{data: {children: [{data}]}}`).
///
/// A body without `data.children` is treated as an empty listing.
pub fn normalize_listing(body: &Value, permalink_base: &str, shape: PostShape) -> Vec<Post> {
    body.pointer("/data/children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .map(|child| {
                    let data = child.get("data").unwrap_or(&Value::Null);
                    normalize_post(data, permalink_base, shape)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn join_permalink(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), path)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

fn text_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(raw: &Value, key: &str) -> i64 {
    match raw.get(key) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}

fn float_field(raw: &Value, key: &str) -> f64 {
    raw.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn bool_field(raw: &Value, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}
