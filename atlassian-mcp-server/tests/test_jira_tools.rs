/// Integration tests for the Jira tools against a mocked Jira server
mod common;

use atlassian_mcp_server::config::AtlassianConfig;
use atlassian_mcp_server::context::InvocationContext;
use common::{call_tool, config_for, extract_tool_result, registry_for, JIRA_TOKEN};
use httpmock::prelude::*;
use serde_json::json;

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_ping_uses_configured_token() {
    let server = MockServer::start_async().await;
    let myself = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/myself")
                .header("Authorization", bearer(JIRA_TOKEN));
            then.status(200).json_body(json!({ "name": "bot" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(&registry, "jira_ping", json!({})).await;

    assert!(!result.is_error(), "ping failed: {}", result.text());
    assert_eq!(result.text(), "Jira OK");
    myself.assert_async().await;
}

#[tokio::test]
async fn test_header_token_overrides_configured_token() {
    let server = MockServer::start_async().await;
    let myself = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/myself")
                .header("Authorization", bearer("header-token"));
            then.status(200).json_body(json!({ "name": "caller" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let ctx = InvocationContext {
        jira_token: Some("header-token".to_string()),
        ..Default::default()
    };
    let result = registry.dispatch("jira_ping", None, ctx).await;

    assert_eq!(result.text(), "Jira OK");
    myself.assert_async().await;
}

#[tokio::test]
async fn test_missing_credentials_fail_without_network() {
    let registry = registry_for(AtlassianConfig::default());
    let result = call_tool(&registry, "jira_ping", json!({})).await;

    assert!(result.is_error());
    assert!(
        result.text().starts_with("Jira client error: missing Jira credentials"),
        "unexpected error: {}",
        result.text()
    );
}

#[tokio::test]
async fn test_get_issue_truncates_comments() {
    let server = MockServer::start_async().await;
    let comments: Vec<_> = (1..=4).map(|i| json!({ "id": i.to_string() })).collect();
    let issue = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/issue/PROJ-7")
                .query_param("fields", "summary,comment")
                .query_param("updateHistory", "true");
            then.status(200).json_body(json!({
                "key": "PROJ-7",
                "fields": { "summary": "Broken build", "comment": { "comments": comments, "total": 4 } }
            }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_get_issue",
        json!({ "issue_key": "PROJ-7", "fields": "summary, comment", "comment_limit": 2 }),
    )
    .await;

    let body = extract_tool_result(&result);
    assert_eq!(body["key"], "PROJ-7");
    let kept = body["fields"]["comment"]["comments"].as_array().unwrap();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0]["id"], "1");
    issue.assert_async().await;
}

#[tokio::test]
async fn test_search_scopes_jql_to_projects() {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/search").json_body(json!({
                "jql": "project in ('A','B') AND (status = Open)",
                "startAt": 0,
                "maxResults": 5,
                "fields": ["summary"],
            }));
            then.status(200).json_body(json!({ "issues": [], "total": 0 }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_search",
        json!({ "jql": "status = Open", "projects_filter": "A, B", "limit": 5, "fields": "summary" }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["total"], 0);
    search.assert_async().await;
}

#[tokio::test]
async fn test_search_fields_returns_values_array() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/field/search")
                .query_param("query", "story")
                .query_param("maxResults", "3");
            then.status(200).json_body(json!({
                "startAt": 0,
                "values": [{ "id": "customfield_10016", "name": "Story Points" }]
            }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_search_fields",
        json!({ "keyword": "story", "limit": 3 }),
    )
    .await;

    let values = extract_tool_result(&result);
    assert_eq!(values[0]["name"], "Story Points");
}

#[tokio::test]
async fn test_update_issue_merges_additional_fields() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path_contains("/issue/PROJ-1").json_body(json!({
                "fields": { "summary": "Override", "priority": { "name": "High" } }
            }));
            then.status(200).json_body(json!({}));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_update_issue",
        json!({
            "issue_key": "PROJ-1",
            "fields": r#"{"summary": "Original", "priority": {"name": "High"}}"#,
            "additional_fields": r#"{"summary": "Override"}"#,
        }),
    )
    .await;

    assert_eq!(result.text(), "Issue updated successfully");
    update.assert_async().await;
}

#[tokio::test]
async fn test_update_issue_rejects_malformed_fields() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT);
            then.status(200).json_body(json!({}));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_update_issue",
        json!({ "issue_key": "PROJ-1", "fields": "{not json" }),
    )
    .await;

    assert!(result.is_error());
    assert!(result.text().starts_with("Invalid parameter: fields"));
    assert_eq!(update.hits_async().await, 0);
}

#[tokio::test]
async fn test_user_profile_uses_username_lookup() {
    let server = MockServer::start_async().await;
    let user = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/user")
                .query_param("username", "jdoe");
            then.status(200).json_body(json!({ "name": "jdoe", "displayName": "J. Doe" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_get_user_profile",
        json!({ "user_identifier": "jdoe" }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["displayName"], "J. Doe");
    user.assert_async().await;
}

#[tokio::test]
async fn test_add_worklog_with_new_estimate() {
    let server = MockServer::start_async().await;
    let worklog = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/issue/PROJ-2/worklog")
                .query_param("adjustEstimate", "new")
                .query_param("newEstimate", "2h")
                .json_body(json!({
                    "timeSpent": "1h",
                    "started": "2024-01-15T09:30:00.000+0000",
                }));
            then.status(201).json_body(json!({ "id": "100" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_add_worklog",
        json!({
            "issue_key": "PROJ-2",
            "time_spent": "1h",
            "started": "2024-01-15T09:30:00Z",
            "original_estimate": "2h",
            "remaining_estimate": "30m",
        }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["id"], "100");
    worklog.assert_async().await;
}

#[tokio::test]
async fn test_agile_boards_use_agile_api() {
    let server = MockServer::start_async().await;
    let boards = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/rest/agile/")
                .path_contains("/board")
                .query_param("type", "scrum")
                .query_param("maxResults", "10");
            then.status(200).json_body(json!({ "values": [{ "id": 3, "name": "Team" }] }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(&registry, "jira_get_agile_boards", json!({ "board_type": "scrum" })).await;

    assert_eq!(extract_tool_result(&result)["values"][0]["id"], 3);
    boards.assert_async().await;
}

#[tokio::test]
async fn test_unsupported_tools_refuse_without_credentials() {
    let registry = registry_for(AtlassianConfig::default());

    for (tool, arguments) in [
        ("jira_download_attachments", json!({ "issue_key": "A-1", "target_dir": "/tmp" })),
        ("jira_batch_create_issues", json!({ "issues": "[]" })),
        ("jira_batch_get_changelogs", json!({ "issue_ids_or_keys": "A-1" })),
    ] {
        let result = call_tool(&registry, tool, arguments).await;
        assert!(result.is_error());
        assert!(
            result
                .text()
                .starts_with(&format!("Unsupported operation: {} is not supported", tool)),
            "unexpected error for {}: {}",
            tool,
            result.text()
        );
    }
}

#[tokio::test]
async fn test_missing_required_parameter() {
    let registry = registry_for(AtlassianConfig::default());
    let result = call_tool(&registry, "jira_transition_issue", json!({ "issue_key": "A-1" })).await;
    assert_eq!(result.text(), "Missing required parameter: transition_id");
}

#[tokio::test]
async fn test_server_error_on_read_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/issue/PROJ-1");
            then.status(503)
                .json_body(json!({ "errorMessages": ["Service Unavailable"] }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(&registry, "jira_get_issue", json!({ "issue_key": "PROJ-1" })).await;

    assert!(result.is_error(), "5xx relayed as success: {}", result.text());
    let text = result.text();
    assert!(text.starts_with("Failed to get issue: 503"), "unexpected error: {}", text);
    assert!(text.contains("Service Unavailable"));
}

#[tokio::test]
async fn test_server_error_on_confirm_only_tools() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/myself");
            then.status(500).json_body(json!({ "message": "boom" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("/issue/PROJ-9");
            then.status(502).body("Bad Gateway");
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));

    let ping = call_tool(&registry, "jira_ping", json!({})).await;
    assert!(ping.is_error());
    assert!(ping.text().starts_with("Jira ping failed: 500"), "unexpected error: {}", ping.text());

    let delete = call_tool(&registry, "jira_delete_issue", json!({ "issue_key": "PROJ-9" })).await;
    assert!(delete.is_error());
    assert!(
        delete.text().starts_with("Failed to delete issue: 502"),
        "unexpected error: {}",
        delete.text()
    );
}

#[tokio::test]
async fn test_no_content_mutations_confirm() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path_contains("/issue/PROJ-3");
            then.status(204);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path_contains("/issue/PROJ-4")
                .query_param("deleteSubtasks", "false");
            then.status(204);
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));

    let result = call_tool(
        &registry,
        "jira_update_issue",
        json!({ "issue_key": "PROJ-3", "fields": r#"{"summary": "New"}"# }),
    )
    .await;
    assert_eq!(result.text(), "Issue updated successfully");

    let result = call_tool(&registry, "jira_delete_issue", json!({ "issue_key": "PROJ-4" })).await;
    assert_eq!(result.text(), "Issue deleted successfully");

    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_transition_merges_fields_and_adds_comment() {
    let server = MockServer::start_async().await;
    let transition = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/issue/PROJ-5/transitions")
                .json_body(json!({
                    "transition": { "id": "31" },
                    "fields": {
                        "resolution": { "name": "Won't Do" },
                        "assignee": { "name": "bob" },
                    },
                    "update": { "comment": [{ "add": { "body": "Closing as duplicate" } }] },
                }));
            then.status(204);
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_transition_issue",
        json!({
            "issue_key": "PROJ-5",
            "transition_id": "31",
            "fields": r#"{"resolution": {"name": "Done"}, "assignee": {"name": "bob"}}"#,
            "additional_fields": r#"{"resolution": {"name": "Won't Do"}}"#,
            "comment": "Closing as duplicate",
        }),
    )
    .await;

    assert_eq!(result.text(), "Issue transitioned successfully");
    transition.assert_async().await;
}

#[tokio::test]
async fn test_transition_without_fields_sends_only_id() {
    let server = MockServer::start_async().await;
    let transition = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/issue/PROJ-6/transitions")
                .json_body(json!({ "transition": { "id": "11" } }));
            then.status(204);
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_transition_issue",
        json!({ "issue_key": "PROJ-6", "transition_id": "11" }),
    )
    .await;

    assert_eq!(result.text(), "Issue transitioned successfully");
    transition.assert_async().await;
}

#[tokio::test]
async fn test_create_issue_builds_fields() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/issue").json_body(json!({
                "fields": {
                    "project": { "key": "PROJ" },
                    "summary": "Login fails",
                    "issuetype": { "name": "Bug" },
                    "description": "Steps attached",
                    "assignee": { "name": "alice" },
                    "components": [{ "name": "Backend" }, { "name": "Auth" }],
                    "priority": { "name": "High" },
                },
            }));
            then.status(201).json_body(json!({ "id": "10001", "key": "PROJ-42" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_create_issue",
        json!({
            "project_key": "PROJ",
            "summary": "Login fails",
            "issue_type": "Bug",
            "description": "Steps attached",
            "assignee": "alice",
            "components": "Backend, Auth,",
            "additional_fields": r#"{"priority": {"name": "High"}, "issuetype": {"name": "Bug"}}"#,
        }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["key"], "PROJ-42");
    create.assert_async().await;
}

#[tokio::test]
async fn test_create_issue_additional_fields_override() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/issue").json_body(json!({
                "fields": {
                    "project": { "key": "PROJ" },
                    "summary": "From additional fields",
                    "issuetype": { "name": "Task" },
                },
            }));
            then.status(201).json_body(json!({ "key": "PROJ-43" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_create_issue",
        json!({
            "project_key": "PROJ",
            "summary": "Original",
            "issue_type": "Task",
            "assignee": "",
            "additional_fields": r#"{"summary": "From additional fields"}"#,
        }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["key"], "PROJ-43");
    create.assert_async().await;
}

#[tokio::test]
async fn test_issue_links() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/issueLink").json_body(json!({
                "type": { "name": "Blocks" },
                "inwardIssue": { "key": "PROJ-1" },
                "outwardIssue": { "key": "PROJ-2" },
                "comment": { "body": "Needs the fix first", "visibility": { "type": "group" } },
            }));
            then.status(201);
        })
        .await;
    let remove = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("/issueLink/10500");
            then.status(204);
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));

    let result = call_tool(
        &registry,
        "jira_create_issue_link",
        json!({
            "link_type": "Blocks",
            "inward_issue_key": "PROJ-1",
            "outward_issue_key": "PROJ-2",
            "comment": "Needs the fix first",
            "comment_visibility": "group",
        }),
    )
    .await;
    assert_eq!(result.text(), "Issue link created successfully");

    let result = call_tool(&registry, "jira_remove_issue_link", json!({ "link_id": "10500" })).await;
    assert_eq!(result.text(), "Issue link removed successfully");

    create.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn test_link_to_epic_uses_agile_api() {
    let server = MockServer::start_async().await;
    let epic = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/rest/agile/")
                .path_contains("/epic/PROJ-100/issue")
                .json_body(json!({ "issues": ["PROJ-7"] }));
            then.status(204);
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_link_to_epic",
        json!({ "issue_key": "PROJ-7", "epic_key": "PROJ-100" }),
    )
    .await;

    assert_eq!(result.text(), "Issue linked to epic successfully");
    epic.assert_async().await;
}

#[tokio::test]
async fn test_create_sprint_payload() {
    let server = MockServer::start_async().await;
    let sprint = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/rest/agile/")
                .path_contains("/sprint")
                .json_body(json!({
                    "name": "Sprint 12",
                    "originBoardId": 7,
                    "startDate": "2024-03-01T09:00:00.000Z",
                    "endDate": "2024-03-15T17:00:00.000Z",
                }));
            then.status(201).json_body(json!({ "id": 55, "state": "future" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_create_sprint",
        json!({
            "board_id": 7,
            "sprint_name": "Sprint 12",
            "start_date": "2024-03-01T09:00:00.000Z",
            "end_date": "2024-03-15T17:00:00.000Z",
            "goal": "  ",
        }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["id"], 55);
    sprint.assert_async().await;
}

#[tokio::test]
async fn test_update_sprint_sends_only_supplied_fields() {
    let server = MockServer::start_async().await;
    let sprint = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains("/rest/agile/")
                .path_contains("/sprint/55")
                .json_body(json!({ "state": "active", "goal": "Ship login" }));
            then.status(200).json_body(json!({ "id": 55, "state": "active" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(
        &registry,
        "jira_update_sprint",
        json!({ "sprint_id": 55, "state": "active", "goal": "Ship login" }),
    )
    .await;

    assert_eq!(extract_tool_result(&result)["state"], "active");
    sprint.assert_async().await;
}

#[tokio::test]
async fn test_issue_key_is_one_path_segment() {
    let server = MockServer::start_async().await;
    let injected = server
        .mock_async(|when, then| {
            when.method(GET).query_param_exists("evil");
            then.status(200).json_body(json!({ "key": "wrong" }));
        })
        .await;
    let encoded = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/issue/PROJ-1%3Fevil%3D1");
            then.status(200).json_body(json!({ "key": "PROJ-1?evil=1" }));
        })
        .await;

    let registry = registry_for(config_for(&server.base_url()));
    let result = call_tool(&registry, "jira_get_issue", json!({ "issue_key": "PROJ-1?evil=1" })).await;

    assert_eq!(extract_tool_result(&result)["key"], "PROJ-1?evil=1");
    encoded.assert_async().await;
    assert_eq!(injected.hits_async().await, 0);
}
