//! Response handling shared by the Jira and Confluence clients

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use serde_json::Value;

/// Parse a 2xx body (empty is `null`); any other status becomes a remote
/// error labelled with `context` and carrying the status and body.
pub async fn json_body(response: reqwest::Response, context: &str) -> AtlassianMcpResult<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, body.trim())
        };
        return Err(AtlassianMcpError::remote(
            context,
            Some(status.as_u16()),
            message,
        ));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}
