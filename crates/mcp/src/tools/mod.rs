mod registry;
pub mod reddit;

pub use reddit::{register_reddit_tools, SearchRedditTool, SubredditPostsTool, UserPostsTool};
pub use registry::{
    json_schema_enum, json_schema_integer, json_schema_object, json_schema_string, Tool,
    ToolRegistry,
};
