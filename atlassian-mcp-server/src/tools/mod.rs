//! Tools module for the Atlassian MCP Server
//!
//! Every tool is a [`ToolDescriptor`](crate::registry::ToolDescriptor) plus an
//! async handler. Handlers only build the request and name the remote call;
//! the helpers here turn the outcome into a [`ToolOutput`] or a labelled error.

pub mod confluence;
pub mod jira;

use crate::config::ToolsetMode;
use crate::error::AtlassianMcpResult;
use crate::registry::{ToolOutput, ToolRegistry};
use serde_json::Value;
use std::future::Future;
use tracing::info;

/// Register the tool families selected by `mode`
pub fn register_all(registry: &mut ToolRegistry, mode: ToolsetMode) -> AtlassianMcpResult<()> {
    if mode.includes_jira() {
        jira::register(registry)?;
    }
    if mode.includes_confluence() {
        confluence::register(registry)?;
    }
    info!("Registered {} tools (mode: {:?})", registry.len(), mode);
    Ok(())
}

/// Await a remote call and relay its JSON body; failures get `label` as prefix.
pub(crate) async fn relay<F>(label: &str, call: F) -> AtlassianMcpResult<ToolOutput>
where
    F: Future<Output = AtlassianMcpResult<Value>>,
{
    call.await
        .map(ToolOutput::Json)
        .map_err(|e| e.context(label))
}

/// Await a remote call whose body carries nothing useful and answer with `message`.
pub(crate) async fn confirm<F>(label: &str, call: F, message: impl Into<String>) -> AtlassianMcpResult<ToolOutput>
where
    F: Future<Output = AtlassianMcpResult<Value>>,
{
    call.await.map_err(|e| e.context(label))?;
    Ok(ToolOutput::text(message))
}

/// Append URL-encoded query pairs to a path, skipping empty values.
pub(crate) fn endpoint(path: &str, query: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in query {
        if !value.is_empty() {
            serializer.append_pair(key, value);
            any = true;
        }
    }

    if any {
        format!("{}?{}", path, serializer.finish())
    } else {
        path.to_string()
    }
}

/// Percent-encode a tool argument for use as one URL path segment
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Normalize a comma-separated list parameter ("a, b," -> "a,b")
pub(crate) fn comma_list(raw: &str) -> String {
    crate::query::split_and_trim(raw).join(",")
}
