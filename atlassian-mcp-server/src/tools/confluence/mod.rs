//! Confluence tools
//!
//! Endpoints are written as `/wiki/rest/api/...`; the client strips the
//! `/wiki` segment so the same paths serve cloud and on-premises sites.

mod comments;
mod pages;
mod search;

use crate::error::AtlassianMcpResult;
use crate::registry::ToolRegistry;

/// Absolute REST path for a content API resource
pub(crate) fn api(resource: &str) -> String {
    format!("/wiki/rest/api/{}", resource.trim_start_matches('/'))
}

pub fn register(registry: &mut ToolRegistry) -> AtlassianMcpResult<()> {
    search::register(registry)?;
    pages::register(registry)?;
    comments::register(registry)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path() {
        assert_eq!(api("search"), "/wiki/rest/api/search");
        assert_eq!(api("/content/42/label"), "/wiki/rest/api/content/42/label");
    }
}
