use crate::error::AtlassianMcpResult;
use crate::jira_client::JiraApi;
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{confirm, relay, segment};
use serde_json::{json, Value};
use tracing::instrument;

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new("jira_get_link_types", "Get all available issue link types.", vec![]),
        get_link_types,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_link_to_epic",
            "Link an existing issue to an epic.",
            vec![
                ParamSpec::required_string("issue_key", "The key of the issue to link"),
                ParamSpec::required_string("epic_key", "The key of the epic to link to"),
            ],
        ),
        link_to_epic,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_create_issue_link",
            "Create a link between two Jira issues.",
            vec![
                ParamSpec::required_string("link_type", "The type of link (e.g., 'Blocks')"),
                ParamSpec::required_string("inward_issue_key", "The key of the source issue"),
                ParamSpec::required_string("outward_issue_key", "The key of the target issue"),
                ParamSpec::string("comment", "Optional comment text", ""),
                ParamSpec::string(
                    "comment_visibility",
                    "Optional JSON string for comment visibility",
                    "",
                ),
            ],
        ),
        create_issue_link,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_remove_issue_link",
            "Remove a link between two Jira issues.",
            vec![ParamSpec::required_string("link_id", "The ID of the link to remove")],
        ),
        remove_issue_link,
    )?;

    Ok(())
}

#[instrument(name = "jira_get_link_types", skip_all)]
async fn get_link_types(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let jira = call.jira()?;
    relay("Failed to get link types", jira.get(JiraApi::Rest, "/issueLinkType")).await
}

#[instrument(name = "jira_link_to_epic", skip_all)]
async fn link_to_epic(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = format!("/epic/{}/issue", segment(&p.string("epic_key")));
    let body = json!({ "issues": [p.string("issue_key")] });

    let jira = call.jira()?;
    confirm(
        "Failed to link to epic",
        jira.post(JiraApi::Agile, &path, body),
        "Issue linked to epic successfully",
    )
    .await
}

/// A JSON object is sent as-is; anything else is taken as the visibility type.
fn comment_visibility(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "type": raw }),
    }
}

fn link_payload(
    link_type: &str,
    inward: &str,
    outward: &str,
    comment: Option<String>,
    visibility: Option<String>,
) -> Value {
    let mut payload = json!({
        "type": { "name": link_type },
        "inwardIssue": { "key": inward },
        "outwardIssue": { "key": outward },
    });
    if let Some(body) = comment {
        let mut comment = json!({ "body": body });
        if let Some(visibility) = visibility {
            comment["visibility"] = comment_visibility(&visibility);
        }
        payload["comment"] = comment;
    }
    payload
}

#[instrument(name = "jira_create_issue_link", skip_all)]
async fn create_issue_link(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let payload = link_payload(
        &p.string("link_type"),
        &p.string("inward_issue_key"),
        &p.string("outward_issue_key"),
        p.non_empty("comment"),
        p.non_empty("comment_visibility"),
    );

    let jira = call.jira()?;
    confirm(
        "Failed to create issue link",
        jira.post(JiraApi::Rest, "/issueLink", payload),
        "Issue link created successfully",
    )
    .await
}

#[instrument(name = "jira_remove_issue_link", skip_all)]
async fn remove_issue_link(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = format!("/issueLink/{}", segment(&call.params.string("link_id")));
    let jira = call.jira()?;
    confirm(
        "Failed to remove issue link",
        jira.delete(JiraApi::Rest, &path),
        "Issue link removed successfully",
    )
    .await
}
