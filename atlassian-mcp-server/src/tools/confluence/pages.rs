//! Page retrieval, hierarchy and mutation tools

use super::api;
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::markdown::render_body;
use crate::params::ParamSpec;
use crate::query::{page_title_cql, split_and_trim};
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{confirm, relay, segment};
use serde_json::{json, Value};
use tracing::{debug, instrument};

const PAGE_EXPAND: &str = "body.storage,version,metadata.labels";
const BODY_STORAGE: &str = "body.storage";

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "confluence_get_page",
            "Get content of a specific Confluence page by its ID, or by its title and space key.",
            vec![
                ParamSpec::string(
                    "page_id",
                    "Confluence page ID (numeric ID, can be found in the page URL). Provide this OR both 'title' and 'space_key'. If page_id is provided, title and space_key will be ignored.",
                    "",
                ),
                ParamSpec::string(
                    "title",
                    "The exact title of the Confluence page. Use this with 'space_key' if 'page_id' is not known.",
                    "",
                ),
                ParamSpec::string(
                    "space_key",
                    "The key of the Confluence space where the page resides (e.g., 'DEV', 'TEAM'). Required if using 'title'.",
                    "",
                ),
                ParamSpec::boolean(
                    "include_metadata",
                    "Whether to include page metadata such as creation date, last update, version, and labels.",
                    true,
                ),
                ParamSpec::boolean(
                    "convert_to_markdown",
                    "Whether to convert page to markdown (true) or keep it in raw HTML format (false).",
                    true,
                ),
            ],
        ),
        get_page,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_get_page_children",
            "Get child pages of a specific Confluence page.",
            vec![
                ParamSpec::required_string(
                    "parent_id",
                    "The ID of the parent page whose children you want to retrieve",
                ),
                ParamSpec::string(
                    "expand",
                    "Fields to expand in the response (e.g., 'version', 'body.storage')",
                    "version",
                ),
                ParamSpec::number("limit", "Maximum number of child pages to return (1-50)", 25),
                ParamSpec::boolean(
                    "include_content",
                    "Whether to include the page content in the response",
                    false,
                ),
                ParamSpec::boolean(
                    "convert_to_markdown",
                    "Whether to convert page content to markdown (true) or keep it in raw HTML format (false). Only relevant if include_content is true.",
                    true,
                ),
                ParamSpec::number("start", "Starting index for pagination (0-based)", 0),
            ],
        ),
        get_page_children,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_create_page",
            "Create a new Confluence page.",
            vec![
                ParamSpec::required_string(
                    "space_key",
                    "The key of the space to create the page in (usually a short uppercase code like 'DEV', 'TEAM', or 'DOC')",
                ),
                ParamSpec::required_string("title", "The title of the page"),
                ParamSpec::required_string(
                    "content",
                    "The content of the page in Markdown format. Supports headings, lists, tables, code blocks, and other Markdown syntax",
                ),
                ParamSpec::string(
                    "parent_id",
                    "(Optional) parent page ID. If provided, this page will be created as a child of the specified page",
                    "",
                ),
            ],
        ),
        create_page,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_update_page",
            "Update an existing Confluence page.",
            vec![
                ParamSpec::required_string("page_id", "The ID of the page to update"),
                ParamSpec::required_string("title", "The new title of the page"),
                ParamSpec::required_string("content", "The new content of the page in Markdown format"),
                ParamSpec::boolean("is_minor_edit", "Whether this is a minor edit", false),
                ParamSpec::string("version_comment", "Optional comment for this version", ""),
                ParamSpec::string("parent_id", "Optional new parent page ID", ""),
            ],
        ),
        update_page,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_delete_page",
            "Delete an existing Confluence page.",
            vec![ParamSpec::required_string("page_id", "The ID of the page to delete")],
        ),
        delete_page,
    )?;

    Ok(())
}

/// `body.storage.value` of a content object, if it was expanded
fn storage_html(content: &Value) -> Option<&str> {
    content.pointer("/body/storage/value").and_then(Value::as_str)
}

#[instrument(name = "confluence_get_page", skip_all)]
async fn get_page(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;

    if let Some(page_id) = p.non_empty("page_id") {
        let confluence = call.confluence()?;
        let page = confluence
            .get(
                &api(&format!("content/{}", segment(&page_id))),
                &[("expand", PAGE_EXPAND.to_string())],
            )
            .await
            .map_err(|e| e.context("Failed to retrieve page by ID"))?;

        if !p.boolean("include_metadata") {
            if let Some(html) = storage_html(&page) {
                let body = render_body(html, p.boolean("convert_to_markdown"))?;
                return Ok(ToolOutput::Json(Value::String(body)));
            }
        }
        return Ok(ToolOutput::Json(page));
    }

    let (Some(title), Some(space_key)) = (p.non_empty("title"), p.non_empty("space_key")) else {
        return Err(AtlassianMcpError::invalid_param(
            "page_id",
            "Either 'page_id' OR both 'title' and 'space_key' must be provided.",
        ));
    };

    let not_found = || {
        AtlassianMcpError::not_found(format!(
            "Page with title '{}' not found in space '{}'",
            title, space_key
        ))
    };

    let confluence = call.confluence()?;
    let mut found = match confluence
        .get(
            &api("search"),
            &[
                ("cql", page_title_cql(&title, &space_key)),
                ("limit", "1".to_string()),
            ],
        )
        .await
    {
        Ok(found) => found,
        Err(e) => {
            debug!("Title lookup failed: {}", e);
            return Err(not_found());
        }
    };

    found
        .pointer_mut("/results/0")
        .map(Value::take)
        .map(ToolOutput::Json)
        .ok_or_else(not_found)
}

/// Expand list for child pages; `body.storage` is added when content is requested.
fn children_expand(expand: &str, include_content: bool) -> String {
    let mut items = split_and_trim(expand);
    if include_content && !items.iter().any(|item| item == BODY_STORAGE) {
        items.push(BODY_STORAGE.to_string());
    }
    items.join(",")
}

#[instrument(name = "confluence_get_page_children", skip_all, fields(parent_id))]
async fn get_page_children(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let parent_id = p.string("parent_id");
    tracing::Span::current().record("parent_id", parent_id.as_str());
    let include_content = p.boolean("include_content");
    let limit = p.number("limit");
    let start = p.number("start");

    let mut query = vec![("start", start.to_string()), ("limit", limit.to_string())];
    let expand = children_expand(&p.string("expand"), include_content);
    if !expand.is_empty() {
        query.insert(0, ("expand", expand));
    }

    let confluence = call.confluence()?;
    let mut children = confluence
        .get(&api(&format!("content/{}/child/page", segment(&parent_id))), &query)
        .await
        .map_err(|e| e.context("Failed to get child pages"))?;

    let mut results = match children.get_mut("results").map(Value::take) {
        Some(Value::Array(results)) => results,
        _ => Vec::new(),
    };

    if include_content {
        let convert = p.boolean("convert_to_markdown");
        for child in &mut results {
            let content = match storage_html(child) {
                Some(html) => render_body(html, convert)?,
                None => String::new(),
            };
            child["content"] = Value::String(content);
        }
    }

    Ok(ToolOutput::Json(json!({
        "parent_id": parent_id,
        "count": results.len(),
        "limit_requested": limit,
        "start_requested": start,
        "results": results,
    })))
}

fn page_payload(title: &str, content: &str, parent_id: Option<String>) -> Value {
    let mut payload = json!({
        "type": "page",
        "title": title,
        "body": {
            "storage": {
                "value": content,
                "representation": "wiki",
            }
        },
    });
    if let Some(parent_id) = parent_id {
        payload["ancestors"] = json!([{ "id": parent_id }]);
    }
    payload
}

#[instrument(name = "confluence_create_page", skip_all)]
async fn create_page(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let mut payload = page_payload(
        &p.string("title"),
        &p.string("content"),
        p.non_empty("parent_id"),
    );
    payload["space"] = json!({ "key": p.string("space_key") });

    let confluence = call.confluence()?;
    relay("Failed to create page", confluence.post(&api("content"), payload)).await
}

/// Version number for the next revision. Absent or zero current versions start at 1.
fn next_version(current: &Value) -> i64 {
    current
        .pointer("/version/number")
        .and_then(Value::as_i64)
        .filter(|n| *n > 0)
        .map_or(1, |n| n + 1)
}

#[instrument(name = "confluence_update_page", skip_all, fields(page_id))]
async fn update_page(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let page_id = p.string("page_id");
    tracing::Span::current().record("page_id", page_id.as_str());
    let path = api(&format!("content/{}", segment(&page_id)));

    let confluence = call.confluence()?;
    let current = confluence
        .get(&path, &[("expand", "version".to_string())])
        .await
        .map_err(|e| e.context("Failed to get current page"))?;

    let mut version = json!({
        "number": next_version(&current),
        "minorEdit": p.boolean("is_minor_edit"),
    });
    if let Some(message) = p.non_empty("version_comment") {
        version["message"] = Value::String(message);
    }

    let mut payload = page_payload(
        &p.string("title"),
        &p.string("content"),
        p.non_empty("parent_id"),
    );
    payload["id"] = Value::String(page_id.clone());
    payload["version"] = version;

    relay("Failed to update page", confluence.put(&path, payload)).await
}

#[instrument(name = "confluence_delete_page", skip_all)]
async fn delete_page(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let page_id = call.params.string("page_id");
    let confluence = call.confluence()?;
    confirm(
        "Failed to delete page",
        confluence.delete(
            &api(&format!("content/{}", segment(&page_id))),
            &[("status", "current".to_string())],
        ),
        format!("Page {} deleted successfully", page_id),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version() {
        assert_eq!(next_version(&json!({"version": {"number": 7}})), 8);
        assert_eq!(next_version(&json!({"version": {"number": 0}})), 1);
        assert_eq!(next_version(&json!({"id": "1"})), 1);
    }

    #[test]
    fn test_children_expand() {
        assert_eq!(children_expand("version", false), "version");
        assert_eq!(children_expand("version", true), "version,body.storage");
        assert_eq!(children_expand("body.storage, version", true), "body.storage,version");
        assert_eq!(children_expand("", false), "");
    }

    #[test]
    fn test_page_payload_ancestors() {
        let payload = page_payload("Title", "h1. Hello", Some("99".into()));
        assert_eq!(payload["ancestors"], json!([{ "id": "99" }]));
        assert_eq!(payload["body"]["storage"]["representation"], "wiki");

        let payload = page_payload("Title", "h1. Hello", None);
        assert!(payload.get("ancestors").is_none());
    }
}
