//! Atlassian MCP Server Library
//!
//! Exposes Jira and Confluence REST operations as Model Context Protocol tools.
//!
//! ## Features
//!
//! - **Tool catalogue**: issues, search, worklogs, boards, sprints and links on
//!   Jira; search, pages, comments and labels on Confluence
//! - **Per-request credentials**: HTTP callers may send their own personal
//!   access tokens, falling back to the configured ones
//! - **Tool filtering**: allow/deny lists from configuration or request headers
//! - **Transports**: stdio, streamable HTTP and SSE

use crate::config::AtlassianConfig;
use crate::context::InvocationContext;
use crate::credentials::CredentialResolver;
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::registry::{ToolFilter, ToolRegistry};

use async_trait::async_trait;
use pulseengine_mcp_protocol::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult, Implementation,
    ListPromptsResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo,
    ToolsCapability,
};
use pulseengine_mcp_server::McpBackend;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub mod config;
pub mod confluence_client;
pub mod context;
pub mod credentials;
pub mod error;
pub mod jira_client;
pub mod markdown;
pub mod params;
pub mod query;
pub mod registry;
pub mod response;
pub mod tools;
pub mod transport;

pub const SERVER_NAME: &str = "atlassian-mcp-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const INSTRUCTIONS: &str = "Provides tools for interacting with Atlassian Jira and Confluence.";

/// `initialize` result advertised on every transport
pub fn server_info_json() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
        },
        "instructions": INSTRUCTIONS,
    })
}

/// The same advertisement as [`server_info_json`], typed for the stdio server.
///
/// The protocol crate's `ServerInfo` uses Rust field names on the wire, so it
/// cannot be deserialized from the camelCase `initialize` result.
pub fn server_info() -> ServerInfo {
    ServerInfo {
        protocol_version: ProtocolVersion::new(PROTOCOL_VERSION),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        },
        instructions: Some(INSTRUCTIONS.to_string()),
    }
}

/// Build the tool registry for a configuration: configured filter, then the
/// tool families selected by the mode.
pub fn build_registry(config: Arc<AtlassianConfig>) -> AtlassianMcpResult<ToolRegistry> {
    let resolver = Arc::new(CredentialResolver::new(Arc::clone(&config)));
    let filter = ToolFilter::new(&config.enabled_tools, &config.disabled_tools);
    let mut registry = ToolRegistry::new(resolver, filter);
    tools::register_all(&mut registry, config.mode)?;
    Ok(registry)
}

/// Atlassian MCP Server
///
/// Owns the shared registry. Implements [`McpBackend`] for the stdio
/// transport; the HTTP transports dispatch through [`Self::registry`].
#[derive(Clone)]
pub struct AtlassianMcpServer {
    registry: Arc<ToolRegistry>,
    config: Arc<AtlassianConfig>,
    server_info: ServerInfo,
}

impl AtlassianMcpServer {
    /// Create a server from environment and file configuration
    #[instrument]
    pub fn new() -> AtlassianMcpResult<Self> {
        info!("Initializing Atlassian MCP Server");
        let config = AtlassianConfig::load()?;
        info!("Configuration loaded successfully");
        Self::with_config(config)
    }

    /// Create a server with an explicit configuration (used by tests)
    #[instrument(skip(config))]
    pub fn with_config(config: AtlassianConfig) -> AtlassianMcpResult<Self> {
        let config = Arc::new(config);
        let registry = Arc::new(build_registry(Arc::clone(&config))?);
        let server_info = server_info();

        info!(
            "Atlassian MCP Server initialized with {} tools",
            registry.len()
        );

        Ok(Self {
            registry,
            config,
            server_info,
        })
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &AtlassianConfig {
        &self.config
    }

    /// `tools/list` result for a context
    pub fn tools_list_json(&self, ctx: &InvocationContext) -> Value {
        tools_list_json(&self.registry, ctx)
    }
}

/// `tools/list` result: visible descriptors in registration order
pub fn tools_list_json(registry: &ToolRegistry, ctx: &InvocationContext) -> Value {
    let tools: Vec<Value> = registry
        .list(ctx)
        .into_iter()
        .map(|descriptor| descriptor.to_json())
        .collect();
    json!({ "tools": tools })
}

#[async_trait]
impl McpBackend for AtlassianMcpServer {
    type Error = AtlassianMcpError;
    type Config = AtlassianConfig;

    async fn initialize(config: Self::Config) -> Result<Self, Self::Error> {
        Self::with_config(config)
    }

    fn get_server_info(&self) -> ServerInfo {
        self.server_info.clone()
    }

    async fn health_check(&self) -> Result<(), Self::Error> {
        if self.registry.is_empty() {
            return Err(AtlassianMcpError::internal("no tools registered"));
        }
        Ok(())
    }

    async fn list_tools(&self, _request: PaginatedRequestParam) -> Result<ListToolsResult, Self::Error> {
        let listing = self.tools_list_json(&InvocationContext::default());
        Ok(serde_json::from_value(listing)?)
    }

    async fn call_tool(&self, request: CallToolRequestParam) -> Result<CallToolResult, Self::Error> {
        debug!("stdio tools/call {}", request.name);
        let result = self
            .registry
            .dispatch(
                &request.name,
                request.arguments.as_ref(),
                InvocationContext::default(),
            )
            .await;
        Ok(serde_json::from_value(result.to_call_result())?)
    }

    async fn list_resources(&self, _request: PaginatedRequestParam) -> Result<ListResourcesResult, Self::Error> {
        Ok(serde_json::from_value(json!({ "resources": [] }))?)
    }

    async fn read_resource(&self, request: ReadResourceRequestParam) -> Result<ReadResourceResult, Self::Error> {
        Err(AtlassianMcpError::unsupported(format!(
            "resource '{}' is not provided by this server",
            request.uri
        )))
    }

    async fn list_prompts(&self, _request: PaginatedRequestParam) -> Result<ListPromptsResult, Self::Error> {
        Ok(serde_json::from_value(json!({ "prompts": [] }))?)
    }

    async fn get_prompt(&self, request: GetPromptRequestParam) -> Result<GetPromptResult, Self::Error> {
        Err(AtlassianMcpError::unsupported(format!(
            "prompt '{}' is not provided by this server",
            request.name
        )))
    }
}
