// MCP (Model Context Protocol) server exposing read-only Reddit tools

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use server::{CallError, McpServer, SERVER_NAME};
pub use tools::{register_reddit_tools, ToolRegistry};
