use crate::error::AtlassianMcpResult;
use crate::jira_client::JiraApi;
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};
use crate::tools::{confirm, endpoint, relay};
use tracing::instrument;

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new("jira_ping", "Ping Jira API", vec![]),
        ping,
    )?;
    registry.register(
        ToolDescriptor::new(
            "jira_get_user_profile",
            "Retrieve profile information for a specific Jira user.",
            vec![ParamSpec::required_string(
                "user_identifier",
                "Identifier for the user (e.g., email address, username, account ID, or key for Server/DC).",
            )],
        ),
        get_user_profile,
    )?;
    Ok(())
}

#[instrument(name = "jira_ping", skip_all)]
async fn ping(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let jira = call.jira()?;
    confirm("Jira ping failed", jira.get(JiraApi::Rest, "/myself"), "Jira OK").await
}

/// The `accountId` query is rewritten to `username` by the client shim.
#[instrument(name = "jira_get_user_profile", skip_all)]
async fn get_user_profile(call: ToolCall) -> AtlassianMcpResult<ToolOutput> {
    let user = call.params.string("user_identifier");
    let jira = call.jira()?;
    relay(
        "Failed to get user profile",
        jira.get(JiraApi::Rest, &endpoint("/user", &[("accountId", user)])),
    )
    .await
}
