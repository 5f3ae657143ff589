//! Comments and worklogs

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::jira_client::JiraApi;
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{endpoint, relay, segment};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::json;
use tracing::instrument;

/// Timestamp layout the worklog API expects, e.g. `2024-01-15T09:30:00.000+0000`
const JIRA_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "jira_add_comment",
            "Add a comment to a Jira issue.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key"),
                ParamSpec::required_string("comment", "Comment text in Markdown"),
            ],
        ),
        add_comment,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_get_worklog",
            "Get worklog entries for a Jira issue.",
            vec![ParamSpec::required_string("issue_key", "Jira issue key (e.g., 'PROJ-123')")],
        ),
        get_worklog,
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_add_worklog",
            "Add a worklog entry to a Jira issue.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key"),
                ParamSpec::required_string("time_spent", "Time spent in Jira format (e.g., '2h 30m')"),
                ParamSpec::string("comment", "Optional comment in Markdown", ""),
                ParamSpec::string("started", "Optional start time in ISO format", ""),
                ParamSpec::string("original_estimate", "Optional new original estimate", ""),
                ParamSpec::string("remaining_estimate", "Optional new remaining estimate", ""),
            ],
        ),
        add_worklog,
    )?;

    Ok(())
}

/// Normalize a user supplied start time to the worklog timestamp layout.
///
/// Inputs without an offset are read as UTC; a bare date means midnight UTC.
///
/// ```
/// use atlassian_mcp_server::tools::jira::normalize_started;
///
/// assert_eq!(
///     normalize_started("2024-01-15").unwrap(),
///     "2024-01-15T00:00:00.000+0000"
/// );
/// assert_eq!(
///     normalize_started("2024-01-15T09:30:00+02:00").unwrap(),
///     "2024-01-15T09:30:00.000+0200"
/// );
/// ```
pub fn normalize_started(raw: &str) -> AtlassianMcpResult<String> {
    let raw = raw.trim();
    let parsed = parse_started(raw).ok_or_else(|| {
        AtlassianMcpError::invalid_param(
            "started",
            format!("unrecognized date/time '{}', expected ISO 8601", raw),
        )
    })?;
    Ok(parsed.format(JIRA_DATETIME).to_string())
}

fn parse_started(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_str(raw, JIRA_DATETIME) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt);
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(Utc.from_utc_datetime(&naive).into())
}

#[instrument(name = "jira_add_comment", skip_all)]
async fn add_comment(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let path = format!("/issue/{}/comment", segment(&p.string("issue_key")));
    let body = json!({ "body": p.string("comment") });
    let jira = call.jira()?;
    relay("Failed to add comment", jira.post(JiraApi::Rest, &path, body)).await
}

#[instrument(name = "jira_get_worklog", skip_all)]
async fn get_worklog(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let path = endpoint(
        &format!("/issue/{}/worklog", segment(&call.params.string("issue_key"))),
        &[
            ("startAt", "0".to_string()),
            ("maxResults", "100".to_string()),
        ],
    );
    let jira = call.jira()?;
    relay("Failed to get worklogs", jira.get(JiraApi::Rest, &path)).await
}

/// Estimate adjustment query. A new original estimate takes precedence.
fn estimate_query(original: Option<String>, remaining: Option<String>) -> Vec<(&'static str, String)> {
    match (original, remaining) {
        (Some(estimate), _) => vec![
            ("adjustEstimate", "new".to_string()),
            ("newEstimate", estimate),
        ],
        (None, Some(reduce_by)) => vec![
            ("adjustEstimate", "manual".to_string()),
            ("reduceBy", reduce_by),
        ],
        (None, None) => Vec::new(),
    }
}

#[instrument(name = "jira_add_worklog", skip_all)]
async fn add_worklog(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;

    let mut body = json!({ "timeSpent": p.string("time_spent") });
    if let Some(comment) = p.non_empty("comment") {
        body["comment"] = json!(comment);
    }
    if let Some(started) = p.non_empty("started") {
        body["started"] = json!(normalize_started(&started)?);
    }

    let query = estimate_query(
        p.non_empty("original_estimate"),
        p.non_empty("remaining_estimate"),
    );
    let path = endpoint(&format!("/issue/{}/worklog", segment(&p.string("issue_key"))), &query);

    let jira = call.jira()?;
    relay("Failed to add worklog", jira.post(JiraApi::Rest, &path, body)).await
}
