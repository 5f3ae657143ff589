//! Atlassian MCP Server - Jira and Confluence tools over MCP
//!
//! Serves the tool catalogue over stdio, streamable HTTP or SSE depending on
//! `MCP_TRANSPORT`.

use atlassian_mcp_server::config::AtlassianConfig;
use atlassian_mcp_server::{transport, AtlassianMcpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout belongs to the stdio transport.
fn configure_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AtlassianConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to start Atlassian MCP Server: {:#}", e);
            eprintln!("\nPlease check:");
            eprintln!("  - JIRA_URL / CONFLUENCE_URL are set for the enabled MCP_MODE");
            eprintln!("  - JIRA_PERSONAL_TOKEN / CONFLUENCE_PERSONAL_TOKEN are set, or sent per request over HTTP");
            eprintln!("  - MCP_TRANSPORT is one of stdio, http, sse");
            eprintln!("\nFor help, see the README.md file.");
            std::process::exit(1);
        }
    };

    configure_logging(config.debug);
    info!(
        "Starting Atlassian MCP Server v{} (mode {:?}, transport {})",
        atlassian_mcp_server::SERVER_VERSION,
        config.mode,
        config.transport
    );

    let server = match AtlassianMcpServer::with_config(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create Atlassian MCP Server: {}", e);
            std::process::exit(1);
        }
    };

    transport::run(server).await
}
