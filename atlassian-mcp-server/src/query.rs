//! Query assembly helpers
//!
//! String building for JQL and CQL filters plus the JSON field-blob merge
//! used by the issue update and transition tools.

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use serde_json::{Map, Value};

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_and_trim(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix a JQL query with a `project in (...)` clause.
///
/// ```
/// use atlassian_mcp_server::query::scope_jql_to_projects;
///
/// assert_eq!(
///     scope_jql_to_projects("status = Open", "A,B"),
///     "project in ('A','B') AND (status = Open)"
/// );
/// assert_eq!(scope_jql_to_projects("status = Open", ""), "status = Open");
/// ```
pub fn scope_jql_to_projects(jql: &str, projects_filter: &str) -> String {
    let projects = split_and_trim(projects_filter);
    if projects.is_empty() {
        return jql.to_string();
    }

    let quoted: Vec<String> = projects.iter().map(|p| format!("'{}'", p)).collect();
    let clause = format!("project in ({})", quoted.join(","));

    if jql.trim().is_empty() {
        clause
    } else {
        format!("{} AND ({})", clause, jql)
    }
}

/// AND a query with an OR-group of space constraints.
///
/// ```
/// use atlassian_mcp_server::query::scope_cql_to_spaces;
///
/// assert_eq!(
///     scope_cql_to_spaces("foo", "DEV, TEAM"),
///     r#"(foo) AND (space="DEV" OR space="TEAM")"#
/// );
/// assert_eq!(scope_cql_to_spaces("foo", ""), "foo");
/// ```
pub fn scope_cql_to_spaces(query: &str, spaces_filter: &str) -> String {
    let spaces = split_and_trim(spaces_filter);
    if spaces.is_empty() {
        return query.to_string();
    }

    let constraints: Vec<String> = spaces
        .iter()
        .map(|space| format!("space=\"{}\"", space))
        .collect();

    format!("({}) AND ({})", query, constraints.join(" OR "))
}

/// CQL locating a single page by exact title within a space
pub fn page_title_cql(title: &str, space_key: &str) -> String {
    format!("title=\"{}\" AND space=\"{}\"", title, space_key)
}

/// JQL selecting every issue of one project
pub fn project_issues_jql(project_key: &str) -> String {
    format!("project = '{}'", project_key)
}

/// Parse a parameter holding a JSON object. Empty input yields an empty map.
pub fn parse_json_object(parameter: &str, raw: &str) -> AtlassianMcpResult<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AtlassianMcpError::invalid_param(
            parameter,
            "expected a JSON object",
        )),
        Err(e) => Err(AtlassianMcpError::invalid_param(
            parameter,
            format!("invalid JSON: {}", e),
        )),
    }
}

/// Shallow merge; keys from `additional` overwrite keys in `primary`.
pub fn merge_fields(mut primary: Map<String, Value>, additional: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in additional {
        primary.insert(key, value);
    }
    primary
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_split_and_trim() {
        assert_eq!(split_and_trim(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_and_trim("  ").is_empty());
    }

    #[test]
    fn test_project_filter_goes_in_front() {
        assert_eq!(
            scope_jql_to_projects("status = Open", "A,B"),
            "project in ('A','B') AND (status = Open)"
        );
        assert_eq!(scope_jql_to_projects("", " A "), "project in ('A')");
    }

    #[test]
    fn test_space_filter() {
        assert_eq!(
            scope_cql_to_spaces("foo", "DEV, TEAM"),
            "(foo) AND (space=\"DEV\" OR space=\"TEAM\")"
        );
        assert_eq!(scope_cql_to_spaces("type=page", " , "), "type=page");
    }

    #[test]
    fn test_page_title_cql() {
        assert_eq!(
            page_title_cql("Release Notes", "DEV"),
            "title=\"Release Notes\" AND space=\"DEV\""
        );
        assert_eq!(project_issues_jql("PROJ"), "project = 'PROJ'");
    }

    #[test]
    fn test_merge_is_last_write_wins() {
        let primary = parse_json_object("fields", r#"{"summary":"old","labels":["a"]}"#).unwrap();
        let additional = parse_json_object("additional_fields", r#"{"summary":"new"}"#).unwrap();

        let merged = merge_fields(primary, additional);
        assert_eq!(Value::Object(merged), json!({"summary": "new", "labels": ["a"]}));
    }

    #[test]
    fn test_malformed_json_is_invalid_param() {
        assert_matches!(
            parse_json_object("fields", "{not json"),
            Err(AtlassianMcpError::InvalidParameter { parameter, .. }) if parameter == "fields"
        );
        assert_matches!(
            parse_json_object("fields", "[1,2]"),
            Err(AtlassianMcpError::InvalidParameter { .. })
        );
        assert!(parse_json_object("fields", "").unwrap().is_empty());
    }
}
