//! Per-invocation execution context
//!
//! Carries the optional override tokens and tool filter a transport extracted
//! from the inbound request. Stdio invocations use the empty context.

use crate::registry::ToolFilter;
use std::fmt;

/// Header carrying a per-request Jira bearer token
pub const JIRA_TOKEN_HEADER: &str = "x-jira-personal-token";
/// Header carrying a per-request Confluence bearer token
pub const CONFLUENCE_TOKEN_HEADER: &str = "x-confluence-personal-token";
/// Per-call allow-list of tool names
pub const ENABLED_TOOLS_HEADER: &str = "x-enabled-tools";
/// Per-call deny-list of tool names
pub const DISABLED_TOOLS_HEADER: &str = "x-disabled-tools";

/// The two Atlassian products the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Jira,
    Confluence,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Jira => f.write_str("Jira"),
            Service::Confluence => f.write_str("Confluence"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub jira_token: Option<String>,
    pub confluence_token: Option<String>,
    /// Replaces the configured filter for this call when set
    pub filter: Option<ToolFilter>,
}

impl InvocationContext {
    pub fn token_for(&self, service: Service) -> Option<&str> {
        match service {
            Service::Jira => self.jira_token.as_deref(),
            Service::Confluence => self.confluence_token.as_deref(),
        }
    }

    /// Build a context from inbound HTTP headers. Blank values count as absent.
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let enabled = header(ENABLED_TOOLS_HEADER);
        let disabled = header(DISABLED_TOOLS_HEADER);
        let filter = if enabled.is_some() || disabled.is_some() {
            Some(ToolFilter::from_lists(
                enabled.as_deref().unwrap_or_default(),
                disabled.as_deref().unwrap_or_default(),
            ))
        } else {
            None
        };

        Self {
            jira_token: header(JIRA_TOKEN_HEADER),
            confluence_token: header(CONFLUENCE_TOKEN_HEADER),
            filter,
        }
    }
}
