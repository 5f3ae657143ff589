//! Tools advertised for catalogue compatibility that refuse to run.
//!
//! None of them touches the network or resolves credentials.

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::params::ParamSpec;
use crate::registry::{ToolCall, ToolDescriptor, ToolOutput, ToolRegistry};

pub(super) fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    registry.register(
        ToolDescriptor::new(
            "jira_download_attachments",
            "Download attachments from a Jira issue.",
            vec![
                ParamSpec::required_string("issue_key", "Jira issue key"),
                ParamSpec::required_string("target_dir", "Directory to save attachments"),
            ],
        ),
        |_call: ToolCall| refuse("jira_download_attachments", "downloading attachments to disk"),
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_batch_create_issues",
            "Create multiple Jira issues in a batch.",
            vec![
                ParamSpec::required_string("issues", "JSON array string of issue objects"),
                ParamSpec::boolean(
                    "validate_only",
                    "If true, only validates without creating",
                    false,
                ),
            ],
        ),
        |_call: ToolCall| refuse("jira_batch_create_issues", "batch issue creation"),
    )?;

    registry.register(
        ToolDescriptor::new(
            "jira_batch_get_changelogs",
            "Get changelogs for multiple Jira issues (Cloud only).",
            vec![
                ParamSpec::required_string(
                    "issue_ids_or_keys",
                    "Comma-separated list of issue IDs or keys",
                ),
                ParamSpec::string(
                    "fields",
                    "Comma-separated list of fields to filter changelogs by. None for all fields.",
                    "",
                ),
                ParamSpec::number("limit", "Maximum changelogs per issue (-1 for all)", -1),
            ],
        ),
        |_call: ToolCall| refuse("jira_batch_get_changelogs", "bulk changelog retrieval (Cloud only)"),
    )?;

    Ok(())
}

async fn refuse(tool: &'static str, what: &'static str) -> AtlassianMcpResult<ToolOutput> {
    Err(AtlassianMcpError::unsupported(format!(
        "{} is not supported by this server: {} is not available through the Jira client",
        tool, what
    )))
}
