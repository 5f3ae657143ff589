//! Error types and handling for the Atlassian MCP Server
//!
//! Every failure a tool can hit is folded into [`AtlassianMcpError`]. The
//! registry renders it as a textual error result, so none of these ever
//! terminate the transport loop.

use serde_json::Value;
use thiserror::Error;

/// Custom error types for the Atlassian MCP Server
#[derive(Debug, Error)]
pub enum AtlassianMcpError {
    /// Configuration errors (-32001)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Missing or empty base URL / token for a service (-32002)
    #[error("{service} client error: {message}")]
    Credentials { service: String, message: String },

    /// A required parameter was not supplied (-32602)
    #[error("Missing required parameter: {parameter}")]
    MissingParameter { parameter: String },

    /// Malformed parameter value or JSON blob (-32602)
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Upstream transport failure or non-2xx status (-32003)
    #[error("{context}: {message}")]
    Remote {
        context: String,
        status: Option<u16>,
        message: String,
    },

    /// A lookup that ran but matched nothing (-32003)
    #[error("{message}")]
    NotFound { message: String },

    /// Operation not available on the remote API surface (-32004)
    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// HTML to Markdown conversion failure (-32005)
    #[error("Failed to convert HTML to Markdown: {message}")]
    Conversion { message: String },

    /// No tool registered under this name (-32601)
    #[error("Unknown tool: {name}")]
    ToolNotFound { name: String },

    /// Tool exists but the active filter hides it (-32601)
    #[error("Tool '{name}' is not enabled")]
    ToolHidden { name: String },

    /// Internal server errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AtlassianMcpError {
    /// Get the MCP JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            AtlassianMcpError::Configuration { .. } => -32001,
            AtlassianMcpError::Credentials { .. } => -32002,
            AtlassianMcpError::MissingParameter { .. } => -32602,
            AtlassianMcpError::InvalidParameter { .. } => -32602,
            AtlassianMcpError::Remote { .. } => -32003,
            AtlassianMcpError::NotFound { .. } => -32003,
            AtlassianMcpError::Unsupported { .. } => -32004,
            AtlassianMcpError::Conversion { .. } => -32005,
            AtlassianMcpError::ToolNotFound { .. } => -32601,
            AtlassianMcpError::ToolHidden { .. } => -32601,
            AtlassianMcpError::Internal { .. } => -32603,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AtlassianMcpError::Configuration { .. } => "configuration",
            AtlassianMcpError::Credentials { .. } => "credentials",
            AtlassianMcpError::MissingParameter { .. } => "validation",
            AtlassianMcpError::InvalidParameter { .. } => "validation",
            AtlassianMcpError::Remote { .. } => "remote",
            AtlassianMcpError::NotFound { .. } => "not_found",
            AtlassianMcpError::Unsupported { .. } => "unsupported",
            AtlassianMcpError::Conversion { .. } => "conversion",
            AtlassianMcpError::ToolNotFound { .. } => "unknown_tool",
            AtlassianMcpError::ToolHidden { .. } => "tool_hidden",
            AtlassianMcpError::Internal { .. } => "internal",
        }
    }

    /// True for parameter errors raised before any remote call
    pub fn is_validation(&self) -> bool {
        self.category() == "validation"
    }

    /// Get additional error data for JSON-RPC error responses
    pub fn error_data(&self) -> Option<Value> {
        let mut data = serde_json::Map::new();
        data.insert(
            "category".to_string(),
            Value::String(self.category().to_string()),
        );

        match self {
            AtlassianMcpError::MissingParameter { parameter }
            | AtlassianMcpError::InvalidParameter { parameter, .. } => {
                data.insert("parameter".to_string(), Value::String(parameter.clone()));
            }
            AtlassianMcpError::Remote {
                status: Some(status),
                ..
            } => {
                data.insert("status".to_string(), Value::Number((*status).into()));
            }
            AtlassianMcpError::Credentials { service, .. } => {
                data.insert("service".to_string(), Value::String(service.clone()));
            }
            AtlassianMcpError::ToolNotFound { name } | AtlassianMcpError::ToolHidden { name } => {
                data.insert("tool".to_string(), Value::String(name.clone()));
            }
            _ => {}
        }

        Some(Value::Object(data))
    }

    /// Re-label a remote error with the short prefix the caller sees.
    /// Other variants pass through untouched.
    pub fn context(self, label: impl Into<String>) -> Self {
        match self {
            AtlassianMcpError::Remote {
                status, message, ..
            } => AtlassianMcpError::Remote {
                context: label.into(),
                status,
                message,
            },
            other => other,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AtlassianMcpError::Configuration {
            message: message.into(),
        }
    }

    /// Create a credentials error for the named service
    pub fn credentials(service: impl Into<String>, message: impl Into<String>) -> Self {
        AtlassianMcpError::Credentials {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_param(parameter: impl Into<String>) -> Self {
        AtlassianMcpError::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        AtlassianMcpError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a remote error
    pub fn remote(context: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        AtlassianMcpError::Remote {
            context: context.into(),
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AtlassianMcpError::NotFound {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        AtlassianMcpError::Unsupported {
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        AtlassianMcpError::Conversion {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        AtlassianMcpError::Internal {
            message: message.into(),
        }
    }
}

/// Convert from gouqi errors, keeping the HTTP status where gouqi exposes one
impl From<gouqi::Error> for AtlassianMcpError {
    fn from(err: gouqi::Error) -> Self {
        let status = match &err {
            gouqi::Error::Unauthorized => Some(401),
            gouqi::Error::NotFound => Some(404),
            gouqi::Error::MethodNotAllowed => Some(405),
            gouqi::Error::Fault { code, .. } => Some(code.as_u16()),
            _ => None,
        };
        AtlassianMcpError::remote("Jira request failed", status, err.to_string())
    }
}

/// Convert from reqwest transport errors
impl From<reqwest::Error> for AtlassianMcpError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        AtlassianMcpError::remote("HTTP request failed", status, err.to_string())
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for AtlassianMcpError {
    fn from(err: serde_json::Error) -> Self {
        AtlassianMcpError::internal(format!("JSON error: {}", err))
    }
}

/// Convert from TOML parsing errors
impl From<toml::de::Error> for AtlassianMcpError {
    fn from(err: toml::de::Error) -> Self {
        AtlassianMcpError::config(format!("TOML parsing error: {}", err))
    }
}

/// Convert from generic anyhow errors (configuration loading)
impl From<anyhow::Error> for AtlassianMcpError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        let lower_message = message.to_lowercase();

        if lower_message.contains("config")
            || lower_message.contains("mode")
            || lower_message.contains("transport")
            || lower_message.contains("url")
        {
            AtlassianMcpError::config(message)
        } else {
            AtlassianMcpError::internal(message)
        }
    }
}

impl From<pulseengine_mcp_server::BackendError> for AtlassianMcpError {
    fn from(err: pulseengine_mcp_server::BackendError) -> Self {
        AtlassianMcpError::internal(err.to_string())
    }
}

impl From<AtlassianMcpError> for pulseengine_mcp_protocol::Error {
    fn from(err: AtlassianMcpError) -> Self {
        if err.is_validation() {
            pulseengine_mcp_protocol::Error::invalid_params(err.to_string())
        } else {
            pulseengine_mcp_protocol::Error::internal_error(err.to_string())
        }
    }
}

/// Result type alias for Atlassian MCP operations
pub type AtlassianMcpResult<T> = Result<T, AtlassianMcpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_error_codes() {
        assert_eq!(AtlassianMcpError::config("test").error_code(), -32001);
        assert_eq!(
            AtlassianMcpError::credentials("Jira", "missing").error_code(),
            -32002
        );
        assert_eq!(AtlassianMcpError::missing_param("jql").error_code(), -32602);
        assert_eq!(
            AtlassianMcpError::remote("Failed", Some(500), "boom").error_code(),
            -32003
        );
        assert_eq!(AtlassianMcpError::unsupported("x").error_code(), -32004);
    }

    #[test]
    fn test_validation_categories() {
        assert!(AtlassianMcpError::missing_param("issue_key").is_validation());
        assert!(AtlassianMcpError::invalid_param("fields", "bad json").is_validation());
        assert!(!AtlassianMcpError::conversion("bad html").is_validation());
        assert_eq!(AtlassianMcpError::conversion("x").category(), "conversion");
    }

    #[test]
    fn test_context_relabels_only_remote_errors() {
        let err = AtlassianMcpError::remote("Jira request failed", Some(404), "Not Found")
            .context("Failed to get issue");
        assert_eq!(err.to_string(), "Failed to get issue: Not Found");
        assert_matches!(err, AtlassianMcpError::Remote { status: Some(404), .. });

        let err = AtlassianMcpError::missing_param("issue_key").context("Failed to get issue");
        assert_eq!(err.to_string(), "Missing required parameter: issue_key");
    }

    #[test]
    fn test_error_data() {
        let data = AtlassianMcpError::remote("Failed", Some(403), "Forbidden")
            .error_data()
            .unwrap();
        assert_eq!(data["category"], "remote");
        assert_eq!(data["status"], 403);

        let data = AtlassianMcpError::invalid_param("fields", "oops")
            .error_data()
            .unwrap();
        assert_eq!(data["parameter"], "fields");
    }

    #[test]
    fn test_gouqi_status_is_kept() {
        let err: AtlassianMcpError = gouqi::Error::NotFound.into();
        assert_matches!(err, AtlassianMcpError::Remote { status: Some(404), .. });

        let err: AtlassianMcpError = gouqi::Error::Unauthorized.into();
        assert_matches!(err, AtlassianMcpError::Remote { status: Some(401), .. });
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AtlassianMcpError = anyhow::anyhow!("Unknown MCP_MODE 'both'").into();
        assert_eq!(err.category(), "configuration");

        let err: AtlassianMcpError = anyhow::anyhow!("something odd").into();
        assert_eq!(err.category(), "internal");
    }
}
