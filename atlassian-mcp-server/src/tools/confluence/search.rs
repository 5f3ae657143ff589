use super::api;
use crate::error::AtlassianMcpResult;
use crate::params::ParamSpec;
use crate::query::scope_cql_to_spaces;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{confirm, relay};
use tracing::{debug, instrument};

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new("confluence_ping", "Ping Confluence API", vec![]),
        ping,
    )?;

    registry.register(
        ToolDescriptor::new(
            "confluence_search",
            "Search Confluence content using simple terms or CQL",
            vec![
                ParamSpec::required_string(
                    "query",
                    "Search query - can be either a simple text or a CQL query string.",
                ),
                ParamSpec::number("limit", "Maximum number of results (1-50)", 10),
                ParamSpec::string(
                    "spaces_filter",
                    "(Optional) Comma-separated list of space keys to filter results by.",
                    "",
                ),
            ],
        ),
        search,
    )?;

    Ok(())
}

/// Out-of-range limits fall back to 10
fn clamp_limit(limit: i64) -> i64 {
    if (1..=50).contains(&limit) {
        limit
    } else {
        10
    }
}

#[instrument(name = "confluence_ping", skip_all)]
async fn ping(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let confluence = call.confluence()?;
    confirm(
        "Confluence ping failed",
        confluence.get(
            &api("search"),
            &[("cql", "type=page".to_string()), ("limit", "1".to_string())],
        ),
        "Confluence OK",
    )
    .await
}

#[instrument(name = "confluence_search", skip_all)]
async fn search(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let p = &call.params;
    let cql = scope_cql_to_spaces(&p.string("query"), &p.string("spaces_filter"));
    let limit = clamp_limit(p.number("limit"));
    debug!("Effective CQL: {}", cql);

    let confluence = call.confluence()?;
    relay(
        "Confluence search failed",
        confluence.get(&api("search"), &[("cql", cql), ("limit", limit.to_string())]),
    )
    .await
}
