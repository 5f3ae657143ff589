//! Comments and labels attached to a page

use super::api;
use crate::error::AtlassianMcpResult;
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{relay, segment};
use serde_json::json;
use tracing::instrument;

const PAGE_ID_DESCRIPTION: &str = "Confluence page ID (numeric ID, can be parsed from URL)";

fn first_page() -> [(&'static str, String); 2] {
    [("start", "0".to_string()), ("limit", "50".to_string())]
}

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "confluence_get_comments",
            "Get comments for a specific Confluence page.",
            vec![ParamSpec::required_string("page_id", PAGE_ID_DESCRIPTION)],
        ),
        get_comments,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_get_labels",
            "Get labels for a specific Confluence page.",
            vec![ParamSpec::required_string("page_id", PAGE_ID_DESCRIPTION)],
        ),
        get_labels,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_add_label",
            "Add label to an existing Confluence page.",
            vec![
                ParamSpec::required_string("page_id", "The ID of the page to update"),
                ParamSpec::required_string("name", "The name of the label"),
            ],
        ),
        add_label,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_add_comment",
            "Add a comment to a Confluence page.",
            vec![
                ParamSpec::required_string("page_id", "The ID of the page to add a comment to"),
                ParamSpec::required_string("content", "The comment content in Markdown format"),
            ],
        ),
        add_comment,
    )?;

    Ok(())
}

#[instrument(name = "confluence_get_comments", skip_all)]
async fn get_comments(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = api(&format!("content/{}/child/comment", segment(&call.params.string("page_id"))));
    let confluence = call.confluence()?;
    relay("Failed to get comments", confluence.get(&path, &first_page())).await
}

#[instrument(name = "confluence_get_labels", skip_all)]
async fn get_labels(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = api(&format!("content/{}/label", segment(&call.params.string("page_id"))));
    let confluence = call.confluence()?;
    relay("Failed to get labels", confluence.get(&path, &first_page())).await
}

#[instrument(name = "confluence_add_label", skip_all)]
async fn add_label(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = api(&format!("content/{}/label", segment(&p.string("page_id"))));
    let body = json!([{ "prefix": "global", "name": p.string("name") }]);

    let confluence = call.confluence()?;
    relay("Failed to add label", confluence.post(&path, body)).await
}

/// Comment bodies are storage format, unlike page bodies.
#[instrument(name = "confluence_add_comment", skip_all)]
async fn add_comment(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let body = json!({
        "type": "comment",
        "container": {
            "type": "page",
            "id": p.string("page_id"),
            "status": "current",
        },
        "body": {
            "storage": {
                "value": p.string("content"),
                "representation": "storage",
            }
        },
    });

    let confluence = call.confluence()?;
    relay("Failed to add comment", confluence.post(&api("content"), body)).await
}
