use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reddit_mcp::protocol::{JsonRpcError, JsonRpcResponse};
use serde_json::Value;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server": state.server_name,
    }))
}

/// JSON-RPC endpoint.
///
/// Protocol and tool errors are returned with 200; internal errors with
/// 500; unparseable bodies with 400; notifications with an empty 202.
pub async fn mcp_endpoint(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Received unparseable request body");
            let response = JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    tracing::debug!(request = %message, "Received request");

    match state.mcp.handle_message(message).await {
        Some(response) => {
            let status = if response.is_internal_error() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(response)).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}
