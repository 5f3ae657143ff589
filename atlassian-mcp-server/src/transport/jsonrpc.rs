//! JSON-RPC 2.0 dispatch for the HTTP and SSE transports
//!
//! One inbound message in, at most one response out. Notifications never
//! produce a response.

use crate::context::InvocationContext;
use crate::registry::ToolRegistry;
use crate::{server_info_json, tools_list_json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none() || self.method.starts_with("notifications/")
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32603, "message": format!("serialization failed: {}", e) }
            })
        })
    }
}

/// Response for a body that is not valid JSON
pub fn parse_error(detail: impl std::fmt::Display) -> Value {
    JsonRpcResponse::failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", detail)).into_value()
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Handle one decoded JSON-RPC message
pub async fn handle_message(registry: &ToolRegistry, message: Value, ctx: InvocationContext) -> Option<Value> {
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected malformed JSON-RPC request: {}", e);
            return Some(
                JsonRpcResponse::failure(Value::Null, INVALID_REQUEST, format!("Invalid request: {}", e))
                    .into_value(),
            );
        }
    };

    if request.is_notification() {
        debug!("Notification {}", request.method);
        return None;
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    debug!(method = %request.method, "JSON-RPC request");

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(id, server_info_json()),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, tools_list_json(registry, &ctx)),
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            match serde_json::from_value::<CallParams>(params) {
                Ok(call) => {
                    let result = registry
                        .dispatch(&call.name, call.arguments.as_ref(), ctx)
                        .await;
                    JsonRpcResponse::success(id, result.to_call_result())
                }
                Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            }
        }
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    };

    Some(response.into_value())
}
