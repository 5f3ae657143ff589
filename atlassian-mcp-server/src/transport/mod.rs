//! Transport selection
//!
//! stdio is served by the pulseengine MCP server over [`AtlassianMcpServer`];
//! the HTTP variants go through the axum routers in [`http`].

pub mod http;
pub mod jsonrpc;

use crate::config::TransportKind;
use crate::AtlassianMcpServer;
use pulseengine_mcp_server::{McpBackend, McpServer, ServerConfig, TransportConfig};
use tracing::info;

/// Serve `server` on its configured transport until shutdown
pub async fn run(server: AtlassianMcpServer) -> anyhow::Result<()> {
    let transport = server.config().transport;
    match transport {
        TransportKind::Stdio => {
            info!("Starting MCP server with STDIO transport...");
            let config = stdio_config(&server);
            let mut mcp = McpServer::new(server, config).await?;
            info!("Atlassian MCP Server is running and ready to serve requests");
            mcp.run().await?;
        }
        TransportKind::Http | TransportKind::Sse => {
            let config = server.config().clone();
            http::serve(&config, server.registry()).await?;
        }
    }
    Ok(())
}

/// pulseengine server settings for the stdio transport
fn stdio_config(server: &AtlassianMcpServer) -> ServerConfig {
    ServerConfig {
        server_info: server.get_server_info(),
        transport_config: TransportConfig::Stdio,
        ..Default::default()
    }
}
