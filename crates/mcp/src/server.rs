// MCP request dispatcher
//
// Stateless: every response is a function of the request and the
// immutable tool registry. No failure escapes as anything other than a
// well-formed JSON-RPC envelope carrying the request's id.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Name reported in `initialize` and by the HTTP health check
pub const SERVER_NAME: &str = "Reddit MCP Server";

/// Reasons a `tools/call` cannot produce a tool result
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0:#}")]
    Failed(anyhow::Error),

    #[error("Internal error: tool task aborted: {0}")]
    Aborted(String),
}

impl CallError {
    pub fn into_jsonrpc(self) -> JsonRpcError {
        match self {
            Self::UnknownTool(name) => JsonRpcError::tool_not_found(&name),
            Self::InvalidParams(_) => JsonRpcError::invalid_params(self.to_string()),
            Self::Failed(_) | Self::Aborted(_) => JsonRpcError::internal_error(self.to_string()),
        }
    }
}

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Handle a raw JSON message.
    ///
    /// Returns `None` for notifications, which take no reply.
    pub async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);

        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting malformed request");
                Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid Request: {}", e)),
                ))
            }
        }
    }

    /// Route a request to initialize, ping, tools/list or tools/call.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Received notification");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, id = %id, "Handling request");

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::from_result(id, &self.initialize(request.params)),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::from_result(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => match self.call_tool(request.params).await {
                Ok(result) => JsonRpcResponse::from_result(id, &result),
                Err(e) => {
                    match &e {
                        CallError::Failed(_) | CallError::Aborted(_) => {
                            tracing::error!(error = %e, "Tool call failed")
                        }
                        _ => tracing::warn!(error = %e, "Tool call rejected"),
                    }
                    JsonRpcResponse::error(id, e.into_jsonrpc())
                }
            },
            other => {
                tracing::warn!(method = other, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };

        Some(response)
    }

    fn initialize(&self, params: Option<Value>) -> InitializeResult {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_protocol = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "Client initialized"
            );
        }

        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: self.info.clone(),
        }
    }

    /// Look up and run a tool.
    ///
    /// The tool runs on its own task so that a panic inside it surfaces
    /// as an internal error instead of tearing down the transport.
    pub async fn call_tool(&self, params: Option<Value>) -> Result<CallToolResult, CallError> {
        let params: CallToolParams = params
            .ok_or_else(|| CallError::InvalidParams("missing params".to_string()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| CallError::InvalidParams(e.to_string()))
            })?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| CallError::UnknownTool(params.name.clone()))?;

        tracing::info!(tool = %params.name, "Calling tool");

        let arguments = params.arguments;
        tokio::spawn(async move { tool.execute(arguments).await })
            .await
            .map_err(|e| CallError::Aborted(e.to_string()))?
            .map_err(CallError::Failed)
    }
}
