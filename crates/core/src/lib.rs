// Core types and upstream access for the Reddit MCP server

pub mod config;
pub mod error;
pub mod normalize;
pub mod source;
pub mod types;

pub use config::{Credentials, RedditConfig};
pub use error::{FetchError, FetchResult};
pub use normalize::{normalize_listing, normalize_post, PostShape};
pub use source::{build_source, AuthenticatedSource, PostSource, PostSourceKind, PublicSource};
pub use types::*;
