//! Boards and sprints (agile API)

use crate::error::AtlassianMcpResult;
use crate::jira_client::JiraApi;
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{comma_list, endpoint, relay};
use serde_json::{json, Map, Value};
use tracing::instrument;

const FIELDS_DESCRIPTION: &str =
    "Comma-separated fields to return in the results. Use '*all' for all fields.";

fn paging() -> [ParamSpec; 2] {
    [
        ParamSpec::number("start_at", "Starting index for pagination (0-based)", 0),
        ParamSpec::number("limit", "Maximum number of results (1-50)", 10),
    ]
}

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    let mut params = vec![
        ParamSpec::string("board_name", "(Optional) The name of board, support fuzzy search", ""),
        ParamSpec::string("project_key", "(Optional) Jira project key (e.g., 'PROJ-123')", ""),
        ParamSpec::string(
            "board_type",
            "(Optional) The type of jira board (e.g., 'scrum', 'kanban')",
            "",
        ),
    ];
    params.extend(paging());
    registry.register(
        ToolDescriptor::new(
            "jira_get_agile_boards",
            "Get Jira agile boards by name, project key, or type.",
            params,
        ),
        get_agile_boards,
    )?;

    let mut params = vec![
        ParamSpec::required_number("board_id", "The id of the board (e.g., '1001')"),
        ParamSpec::required_string("jql", "JQL query string to filter issues."),
        ParamSpec::string("fields", FIELDS_DESCRIPTION, ""),
    ];
    params.extend(paging());
    params.push(ParamSpec::string(
        "expand",
        "Optional fields to expand in the response (e.g., 'changelog').",
        "version",
    ));
    registry.register(
        ToolDescriptor::new(
            "jira_get_board_issues",
            "Get all issues linked to a specific board filtered by JQL.",
            params,
        ),
        get_board_issues,
    )?;

    let mut params = vec![
        ParamSpec::required_number("board_id", "The id of board (e.g., '1000')"),
        ParamSpec::string("state", "Sprint state (e.g., 'active', 'future', 'closed')", ""),
    ];
    params.extend(paging());
    registry.register(
        ToolDescriptor::new(
            "jira_get_sprints_from_board",
            "Get Jira sprints from board by state.",
            params,
        ),
        get_sprints_from_board,
    )?;

    let mut params = vec![
        ParamSpec::required_number("sprint_id", "The id of sprint (e.g., '10001')"),
        ParamSpec::string("fields", FIELDS_DESCRIPTION, ""),
    ];
    params.extend(paging());
    registry.register(
        ToolDescriptor::new("jira_get_sprint_issues", "Get Jira issues from sprint.", params),
        get_sprint_issues,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_create_sprint",
            "Create Jira sprint for a board.",
            vec![
                ParamSpec::required_number("board_id", "Board ID"),
                ParamSpec::required_string("sprint_name", "Sprint name"),
                ParamSpec::string("start_date", "Start date (ISO format)", ""),
                ParamSpec::string("end_date", "End date (ISO format)", ""),
                ParamSpec::string("goal", "Optional sprint goal", ""),
            ],
        ),
        create_sprint,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_update_sprint",
            "Update jira sprint.",
            vec![
                ParamSpec::required_number("sprint_id", "The ID of the sprint"),
                ParamSpec::string("sprint_name", "Optional new name", ""),
                ParamSpec::string("state", "Optional new state (future|active|closed)", ""),
                ParamSpec::string("start_date", "Optional new start date", ""),
                ParamSpec::string("end_date", "Optional new end date", ""),
                ParamSpec::string("goal", "Optional new goal", ""),
            ],
        ),
        update_sprint,
    )?;

    Ok(())
}

#[instrument(name = "jira_get_agile_boards", skip_all)]
async fn get_agile_boards(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = endpoint(
        "/board",
        &[
            ("name", p.string("board_name")),
            ("projectKeyOrId", p.string("project_key")),
            ("type", p.string("board_type")),
            ("startAt", p.number("start_at").to_string()),
            ("maxResults", p.number("limit").to_string()),
        ],
    );
    let jira = call.jira()?;
    relay("Failed to get agile boards", jira.get(JiraApi::Agile, &path)).await
}

#[instrument(name = "jira_get_board_issues", skip_all)]
async fn get_board_issues(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = endpoint(
        &format!("/board/{}/issue", p.number("board_id")),
        &[
            ("jql", p.string("jql")),
            ("fields", comma_list(&p.string("fields"))),
            ("startAt", p.number("start_at").to_string()),
            ("maxResults", p.number("limit").to_string()),
            ("expand", comma_list(&p.string("expand"))),
        ],
    );
    let jira = call.jira()?;
    relay("Failed to get board issues", jira.get(JiraApi::Agile, &path)).await
}

#[instrument(name = "jira_get_sprints_from_board", skip_all)]
async fn get_sprints_from_board(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = endpoint(
        &format!("/board/{}/sprint", p.number("board_id")),
        &[
            ("state", comma_list(&p.string("state"))),
            ("startAt", p.number("start_at").to_string()),
            ("maxResults", p.number("limit").to_string()),
        ],
    );
    let jira = call.jira()?;
    relay("Failed to get sprints from board", jira.get(JiraApi::Agile, &path)).await
}

#[instrument(name = "jira_get_sprint_issues", skip_all)]
async fn get_sprint_issues(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = endpoint(
        &format!("/sprint/{}/issue", p.number("sprint_id")),
        &[
            ("fields", comma_list(&p.string("fields"))),
            ("startAt", p.number("start_at").to_string()),
            ("maxResults", p.number("limit").to_string()),
        ],
    );
    let jira = call.jira()?;
    relay("Failed to get sprint issues", jira.get(JiraApi::Agile, &path)).await
}

/// Copy each non-blank optional parameter into the sprint payload under its API name
fn sprint_payload(call: &ToolCall, mapping: &[(&str, &str)]) -> Map<String, Value> {
    let mut payload = Map::new();
    for (param, key) in mapping {
        if let Some(value) = call.params.non_empty(param) {
            payload.insert((*key).to_string(), Value::String(value));
        }
    }
    payload
}

#[instrument(name = "jira_create_sprint", skip_all)]
async fn create_sprint(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let mut payload = sprint_payload(
        &call,
        &[("start_date", "startDate"), ("end_date", "endDate"), ("goal", "goal")],
    );
    payload.insert("name".into(), json!(call.params.string("sprint_name")));
    payload.insert("originBoardId".into(), json!(call.params.number("board_id")));

    let jira = call.jira()?;
    relay(
        "Failed to create sprint",
        jira.post(JiraApi::Agile, "/sprint", Value::Object(payload)),
    )
    .await
}

/// Partial update; only the supplied fields are sent.
#[instrument(name = "jira_update_sprint", skip_all)]
async fn update_sprint(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let payload = sprint_payload(
        &call,
        &[
            ("sprint_name", "name"),
            ("state", "state"),
            ("start_date", "startDate"),
            ("end_date", "endDate"),
            ("goal", "goal"),
        ],
    );
    let path = format!("/sprint/{}", call.params.number("sprint_id"));

    let jira = call.jira()?;
    relay(
        "Failed to update sprint",
        jira.post(JiraApi::Agile, &path, Value::Object(payload)),
    )
    .await
}
