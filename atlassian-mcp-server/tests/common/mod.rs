/// Common utilities for Atlassian MCP Server integration tests
///
/// Everything runs in-process: the registry and the axum routers are pointed
/// at an httpmock server standing in for Jira and Confluence.
use atlassian_mcp_server::config::{AtlassianConfig, TransportKind};
use atlassian_mcp_server::context::InvocationContext;
use atlassian_mcp_server::registry::{InvocationResult, ToolRegistry};
use atlassian_mcp_server::transport::http::router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

pub const JIRA_TOKEN: &str = "jira-env-token";
pub const CONFLUENCE_TOKEN: &str = "confluence-env-token";

/// Configuration with both services pointed at `base_url`
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> AtlassianConfig {
    let mut config = AtlassianConfig::default();
    config.jira.url = base_url.to_string();
    config.jira.personal_token = JIRA_TOKEN.to_string();
    config.confluence.url = base_url.to_string();
    config.confluence.personal_token = CONFLUENCE_TOKEN.to_string();
    config
}

#[allow(dead_code)]
pub fn registry_for(config: AtlassianConfig) -> Arc<ToolRegistry> {
    Arc::new(atlassian_mcp_server::build_registry(Arc::new(config)).expect("registry builds"))
}

/// Invoke a tool directly with the empty context
#[allow(dead_code)]
pub async fn call_tool(registry: &ToolRegistry, name: &str, arguments: Value) -> InvocationResult {
    registry
        .dispatch(name, Some(&arguments), InvocationContext::default())
        .await
}

/// Parse the text of a successful invocation as JSON
#[allow(dead_code)]
pub fn extract_tool_result(result: &InvocationResult) -> Value {
    match result {
        InvocationResult::Success(output) => {
            serde_json::from_str(&output.render()).expect("tool output is JSON")
        }
        InvocationResult::Error(message) => panic!("tool call failed: {}", message),
    }
}

/// Raw HTTP exchange against a router
#[allow(dead_code)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl HttpReply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

#[allow(dead_code)]
pub fn http_router(registry: Arc<ToolRegistry>) -> Router {
    router(registry, TransportKind::Http)
}

#[allow(dead_code)]
pub async fn send(router: Router, request: Request<Body>) -> HttpReply {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes()
        .to_vec();
    HttpReply {
        status,
        headers,
        body,
    }
}

/// POST a JSON-RPC request to `/mcp` with extra headers
#[allow(dead_code)]
pub async fn post_rpc(router: Router, method: &str, params: Value, headers: &[(&str, &str)]) -> HttpReply {
    let id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
    let message = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });

    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(message.to_string()))
        .expect("request builds");
    send(router, request).await
}

/// Text of the first content item of a `tools/call` JSON-RPC response
#[allow(dead_code)]
pub fn call_text(response: &Value) -> String {
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Tool names of a `tools/list` JSON-RPC response
#[allow(dead_code)]
pub fn listed_names(response: &Value) -> Vec<String> {
    response["result"]["tools"]
        .as_array()
        .map(|tools| {
            tools
                .iter()
                .filter_map(|tool| tool["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
