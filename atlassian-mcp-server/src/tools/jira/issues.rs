//! Issue read and mutation tools

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::jira_client::{read_attachments, JiraApi};
use crate::params::ParamSpec;
use crate::query::{merge_fields, parse_json_object, split_and_trim};
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{comma_list, confirm, endpoint, relay, segment};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "jira_get_issue",
            "Get details of a specific Jira issue.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key (e.g., 'PROJ-123')"),
                ParamSpec::string(
                    "fields",
                    "Comma-separated list of fields to return (e.g., 'summary,status'). Use '*all' for all fields.",
                    "",
                ),
                ParamSpec::string(
                    "expand",
                    "Fields to expand (e.g., 'renderedFields', 'transitions', 'changelog')",
                    "",
                ),
                ParamSpec::number(
                    "comment_limit",
                    "Maximum number of comments to include (0 for none)",
                    10,
                ),
                ParamSpec::string(
                    "properties",
                    "Comma-separated list of issue properties to return",
                    "",
                ),
                ParamSpec::boolean(
                    "update_history",
                    "Whether to update the issue view history for the requesting user",
                    true,
                ),
            ],
        ),
        get_issue,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_get_transitions",
            "Get available status transitions for a Jira issue.",
            vec![ParamSpec::required_string("issue_key", "Jira issue key (e.g., 'PROJ-123')")],
        ),
        get_transitions,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_create_issue",
            "Create a new Jira issue with optional Epic link or parent for subtasks.",
            vec![
                ParamSpec::required_string("project_key", "The JIRA project key"),
                ParamSpec::required_string("summary", "Summary/title of the issue"),
                ParamSpec::required_string(
                    "issue_type",
                    "Issue type (e.g., 'Task', 'Bug', 'Story', 'Epic', 'Subtask')",
                ),
                ParamSpec::string(
                    "assignee",
                    "Assignee's user identifier (email, display name, or account ID)",
                    "",
                ),
                ParamSpec::string("description", "Issue description", ""),
                ParamSpec::string("components", "Comma-separated list of component names", ""),
                ParamSpec::string("additional_fields", "JSON string of additional fields", ""),
            ],
        ),
        create_issue,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_update_issue",
            "Update an existing Jira issue including changing status, adding Epic links, updating fields, etc.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key"),
                ParamSpec::required_string("fields", "JSON string of fields to update"),
                ParamSpec::string(
                    "additional_fields",
                    "Optional JSON string of additional fields",
                    "",
                ),
                ParamSpec::string(
                    "attachments",
                    "Optional JSON array string or comma-separated list of file paths",
                    "",
                ),
            ],
        ),
        update_issue,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_delete_issue",
            "Delete an existing Jira issue.",
            vec![ParamSpec::required_string("issue_key", "Jira issue key")],
        ),
        delete_issue,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_transition_issue",
            "Transition a Jira issue to a new status.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key"),
                ParamSpec::required_string("transition_id", "ID of the transition"),
                ParamSpec::string(
                    "fields",
                    "Optional JSON string of fields to update during transition",
                    "",
                ),
                ParamSpec::string("comment", "Optional comment for the transition", ""),
                ParamSpec::string(
                    "additional_fields",
                    "Optional JSON string of fields merged over 'fields'",
                    "",
                ),
            ],
        ),
        transition_issue,
    )?;

    Ok(())
}

/// Keep the first `limit` embedded comments. A limit of zero or below keeps all.
pub fn truncate_comments(issue: &mut Value, limit: i64) {
    if limit <= 0 {
        return;
    }
    if let Some(comments) = issue
        .pointer_mut("/fields/comment/comments")
        .and_then(Value::as_array_mut)
    {
        let limit = limit as usize;
        if limit < comments.len() {
            comments.truncate(limit);
        }
    }
}

#[instrument(name = "jira_get_issue", skip_all, fields(issue_key))]
async fn get_issue(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let issue_key = p.string("issue_key");
    tracing::Span::current().record("issue_key", issue_key.as_str());

    let path = endpoint(
        &format!("/issue/{}", segment(&issue_key)),
        &[
            ("fields", comma_list(&p.string("fields"))),
            ("expand", comma_list(&p.string("expand"))),
            ("properties", comma_list(&p.string("properties"))),
            ("updateHistory", p.boolean("update_history").to_string()),
        ],
    );

    let jira = call.jira()?;
    let mut issue = jira
        .get(JiraApi::Rest, &path)
        .await
        .map_err(|e| e.context("Failed to get issue"))?;

    truncate_comments(&mut issue, p.number("comment_limit"));
    Ok(ToolOutput::Json(issue))
}

#[instrument(name = "jira_get_transitions", skip_all)]
async fn get_transitions(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = format!("/issue/{}/transitions", segment(&call.params.string("issue_key")));
    let jira = call.jira()?;
    relay("Failed to get transitions", jira.get(JiraApi::Rest, &path)).await
}

#[instrument(name = "jira_create_issue", skip_all)]
async fn create_issue(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let additional = parse_json_object("additional_fields", &p.string("additional_fields"))?;

    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": p.string("project_key") }));
    fields.insert("summary".into(), json!(p.string("summary")));
    fields.insert("issuetype".into(), json!({ "name": p.string("issue_type") }));
    if let Some(description) = p.non_empty("description") {
        fields.insert("description".into(), json!(description));
    }
    if let Some(assignee) = p.non_empty("assignee") {
        fields.insert("assignee".into(), json!({ "name": assignee }));
    }
    let components: Vec<Value> = split_and_trim(&p.string("components"))
        .into_iter()
        .map(|name| json!({ "name": name }))
        .collect();
    if !components.is_empty() {
        fields.insert("components".into(), Value::Array(components));
    }

    let fields = merge_fields(fields, additional);
    let jira = call.jira()?;
    relay(
        "Failed to create issue",
        jira.post(JiraApi::Rest, "/issue", json!({ "fields": fields })),
    )
    .await
}

/// Accepts `["a.txt","b.txt"]` or `a.txt, b.txt`
fn parse_attachment_paths(raw: &str) -> AtlassianMcpResult<Vec<PathBuf>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let paths: Vec<String> = serde_json::from_str(raw).map_err(|e| {
            AtlassianMcpError::invalid_param("attachments", format!("invalid JSON array: {}", e))
        })?;
        Ok(paths
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect())
    } else {
        Ok(split_and_trim(raw).into_iter().map(PathBuf::from).collect())
    }
}

#[instrument(name = "jira_update_issue", skip_all, fields(issue_key))]
async fn update_issue(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let issue_key = p.string("issue_key");
    tracing::Span::current().record("issue_key", issue_key.as_str());

    let fields = merge_fields(
        parse_json_object("fields", &p.string("fields"))?,
        parse_json_object("additional_fields", &p.string("additional_fields"))?,
    );
    let paths = parse_attachment_paths(&p.string("attachments"))?;
    let files = read_attachments(&paths).await?;

    let jira = call.jira()?;
    jira.put(
        JiraApi::Rest,
        &format!("/issue/{}", segment(&issue_key)),
        json!({ "fields": fields }),
    )
    .await
    .map_err(|e| e.context("Failed to update issue"))?;

    if files.is_empty() {
        return Ok(ToolOutput::text("Issue updated successfully"));
    }

    match jira.upload_attachments(&segment(&issue_key), files).await {
        Ok(count) => {
            info!("Attached {} file(s) to {}", count, issue_key);
            Ok(ToolOutput::text(format!(
                "Issue updated successfully ({} attachment(s) uploaded)",
                count
            )))
        }
        Err(e) => {
            warn!("Fields of {} were updated but the upload failed", issue_key);
            Err(e.context("Issue fields updated, but attachment upload failed"))
        }
    }
}

#[instrument(name = "jira_delete_issue", skip_all)]
async fn delete_issue(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = endpoint(
        &format!("/issue/{}", segment(&call.params.string("issue_key"))),
        &[("deleteSubtasks", "false".to_string())],
    );
    let jira = call.jira()?;
    confirm(
        "Failed to delete issue",
        jira.delete(JiraApi::Rest, &path),
        "Issue deleted successfully",
    )
    .await
}

#[instrument(name = "jira_transition_issue", skip_all)]
async fn transition_issue(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let fields = merge_fields(
        parse_json_object("fields", &p.string("fields"))?,
        parse_json_object("additional_fields", &p.string("additional_fields"))?,
    );

    let mut body = json!({ "transition": { "id": p.string("transition_id") } });
    if !fields.is_empty() {
        body["fields"] = Value::Object(fields);
    }
    if let Some(comment) = p.non_empty("comment") {
        body["update"] = json!({ "comment": [{ "add": { "body": comment } }] });
    }

    let path = format!("/issue/{}/transitions", segment(&p.string("issue_key")));
    let jira = call.jira()?;
    confirm(
        "Failed to transition issue",
        jira.post(JiraApi::Rest, &path, body),
        "Issue transitioned successfully",
    )
    .await
}
