use crate::error::AtlassianMcpResult;
use crate::jira_client::JiraApi;
use crate::params::ParamSpec;
use crate::query::{project_issues_jql, scope_jql_to_projects, split_and_trim};
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{endpoint, relay};
use serde_json::{json, Value};
use tracing::{debug, instrument};

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "jira_search",
            "Search Jira issues using JQL (Jira Query Language).",
            vec![
                ParamSpec::required_string(
                    "jql",
                    "JQL query string (e.g., 'project = PROJ AND status = \"In Progress\"')",
                ),
                ParamSpec::string(
                    "fields",
                    "Comma-separated fields to return in the results. Use '*all' for all fields.",
                    "",
                ),
                ParamSpec::number("limit", "Maximum number of results (1-50)", 10),
                ParamSpec::number("start_at", "Starting index for pagination (0-based)", 0),
                ParamSpec::string(
                    "projects_filter",
                    "Comma-separated list of project keys to filter results by.",
                    "",
                ),
                ParamSpec::string(
                    "expand",
                    "Fields to expand (e.g., 'renderedFields', 'transitions', 'changelog')",
                    "",
                ),
            ],
        ),
        search,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_search_fields",
            "Search Jira fields by keyword with fuzzy match.",
            vec![
                ParamSpec::string(
                    "keyword",
                    "Keyword for fuzzy search. If left empty, lists the first 'limit' available fields in their default order.",
                    "",
                ),
                ParamSpec::number("limit", "Maximum number of results", 10),
                ParamSpec::boolean("refresh", "Whether to force refresh the field list", false),
            ],
        ),
        search_fields,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_get_project_issues",
            "Get all issues for a specific Jira project.",
            vec![
                ParamSpec::required_string("project_key", "The project key"),
                ParamSpec::number("limit", "Maximum number of results (1-50)", 10),
                ParamSpec::number("start_at", "Starting index for pagination (0-based)", 0),
            ],
        ),
        get_project_issues,
    )?;

    Ok(())
}

/// Body of `POST /search`. Empty field and expand lists are omitted.
fn search_body(jql: &str, fields: &str, expand: &str, start_at: i64, limit: i64) -> Value {
    let mut body = json!({
        "jql": jql,
        "startAt": start_at,
        "maxResults": limit,
    });
    let fields = split_and_trim(fields);
    if !fields.is_empty() {
        body["fields"] = json!(fields);
    }
    let expand = split_and_trim(expand);
    if !expand.is_empty() {
        body["expand"] = json!(expand);
    }
    body
}

#[instrument(name = "jira_search", skip_all)]
async fn search(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let jql = scope_jql_to_projects(&p.string("jql"), &p.string("projects_filter"));
    debug!("Effective JQL: {}", jql);

    let body = search_body(
        &jql,
        &p.string("fields"),
        &p.string("expand"),
        p.number("start_at"),
        p.number("limit"),
    );
    let jira = call.jira()?;
    relay("Failed to search issues", jira.post(JiraApi::Rest, "/search", body)).await
}

/// `refresh` is accepted for compatibility; every call hits the server.
#[instrument(name = "jira_search_fields", skip_all)]
async fn search_fields(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = endpoint(
        "/field/search",
        &[
            ("query", p.string("keyword")),
            ("startAt", "0".to_string()),
            ("maxResults", p.number("limit").to_string()),
        ],
    );

    let jira = call.jira()?;
    let mut page = jira
        .get(JiraApi::Rest, &path)
        .await
        .map_err(|e| e.context("Failed to search fields"))?;

    let values = page
        .get_mut("values")
        .map(Value::take)
        .unwrap_or_else(|| Value::Array(Vec::new()));
    Ok(ToolOutput::Json(values))
}

#[instrument(name = "jira_get_project_issues", skip_all)]
async fn get_project_issues(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let body = search_body(
        &project_issues_jql(&p.string("project_key")),
        "",
        "",
        p.number("start_at"),
        p.number("limit"),
    );
    let jira = call.jira()?;
    relay("Failed to get project issues", jira.post(JiraApi::Rest, "/search", body)).await
}
