//! Configuration management for the Atlassian MCP Server
//!
//! Handles loading configuration from environment variables, TOML files,
//! and provides defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// TOML files searched by [`AtlassianConfig::load`], in order
pub const CONFIG_FILES: [&str; 2] = ["config/atlassian-mcp-config.toml", "atlassian-mcp-config.toml"];

/// Base URL and fallback token for one Atlassian product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Instance URL, e.g. `https://jira.example.com`
    pub url: String,

    /// Personal access token used when a request carries no override
    pub personal_token: String,
}

/// Which tool families get registered at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolsetMode {
    #[default]
    All,
    Jira,
    Confluence,
}

impl ToolsetMode {
    pub fn includes_jira(self) -> bool {
        matches!(self, ToolsetMode::All | ToolsetMode::Jira)
    }

    pub fn includes_confluence(self) -> bool {
        matches!(self, ToolsetMode::All | ToolsetMode::Confluence)
    }
}

impl FromStr for ToolsetMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ToolsetMode::All),
            "jira" => Ok(ToolsetMode::Jira),
            "confluence" => Ok(ToolsetMode::Confluence),
            other => Err(anyhow::anyhow!(
                "Unknown MCP_MODE '{}', expected all, jira or confluence",
                other
            )),
        }
    }
}

/// Wire surface the registry is served over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
    Sse,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "stdio" => Ok(TransportKind::Stdio),
            "http" | "streamable-http" => Ok(TransportKind::Http),
            "sse" => Ok(TransportKind::Sse),
            other => Err(anyhow::anyhow!(
                "Unknown MCP_TRANSPORT '{}', expected stdio, http or sse",
                other
            )),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
            TransportKind::Sse => "sse",
        };
        f.write_str(name)
    }
}

/// Main configuration structure, built once at startup and shared read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlassianConfig {
    pub jira: ServiceConfig,
    pub confluence: ServiceConfig,

    /// Tool families to register (default: all)
    pub mode: ToolsetMode,

    /// Allow-list of tool names; wins over `disabled_tools` when non-empty
    pub enabled_tools: Vec<String>,

    /// Deny-list of tool names
    pub disabled_tools: Vec<String>,

    pub transport: TransportKind,

    /// Bind address for the HTTP transports (default: 127.0.0.1)
    pub host: String,

    /// Bind port for the HTTP transports (default: 8080)
    pub port: u16,

    /// Verbose logging
    pub debug: bool,
}

impl Default for AtlassianConfig {
    fn default() -> Self {
        Self {
            jira: ServiceConfig::default(),
            confluence: ServiceConfig::default(),
            mode: ToolsetMode::All,
            enabled_tools: Vec::new(),
            disabled_tools: Vec::new(),
            transport: TransportKind::Stdio,
            host: "127.0.0.1".to_string(),
            port: 8080,
            debug: false,
        }
    }
}

impl AtlassianConfig {
    /// Load configuration from environment variables, TOML file, and defaults
    /// Priority: env vars > TOML file > defaults
    pub fn load() -> Result<Self> {
        let mut config = match Self::load_first_file(&CONFIG_FILES)? {
            Some(file_config) => file_config,
            None => {
                debug!("No TOML configuration file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.load_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse the first candidate file that exists.
    ///
    /// A file that exists but cannot be read or parsed is an error rather than
    /// a fall-through to the next candidate.
    pub fn load_first_file<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<Self>> {
        for path in candidates {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let config = Self::load_from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok(Some(config));
        }
        Ok(None)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("JIRA_URL") {
            self.jira.url = url.trim().to_string();
            debug!("Loaded JIRA_URL from environment");
        }
        if let Ok(token) = env::var("JIRA_PERSONAL_TOKEN") {
            self.jira.personal_token = token.trim().to_string();
            debug!("Loaded JIRA_PERSONAL_TOKEN from environment");
        }
        if let Ok(url) = env::var("CONFLUENCE_URL") {
            self.confluence.url = url.trim().to_string();
            debug!("Loaded CONFLUENCE_URL from environment");
        }
        if let Ok(token) = env::var("CONFLUENCE_PERSONAL_TOKEN") {
            self.confluence.personal_token = token.trim().to_string();
            debug!("Loaded CONFLUENCE_PERSONAL_TOKEN from environment");
        }

        if let Ok(mode) = env::var("MCP_MODE") {
            self.mode = mode.parse()?;
            debug!("Set tool mode to {:?} from environment", self.mode);
        }

        if let Ok(enabled) = env::var("ENABLED_TOOLS") {
            self.enabled_tools = crate::query::split_and_trim(&enabled);
        }
        if let Ok(disabled) = env::var("DISABLED_TOOLS") {
            self.disabled_tools = crate::query::split_and_trim(&disabled);
        }

        if let Ok(transport) = env::var("MCP_TRANSPORT") {
            self.transport = transport.parse()?;
            debug!("Set transport to {} from environment", self.transport);
        }

        if let Ok(host) = env::var("MCP_HOST") {
            if !host.trim().is_empty() {
                self.host = host.trim().to_string();
            }
        }

        if let Ok(port) = env::var("MCP_PORT") {
            self.port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("MCP_PORT must be a port number, got '{}'", port))?;
        }

        if let Ok(flag) = env::var("MCP_DEBUG") {
            self.debug = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Missing credentials only warn: a per-request header token may still
    /// supply them, and resolution fails per invocation otherwise.
    fn validate(&self) -> Result<()> {
        for (name, service, included) in [
            ("Jira", &self.jira, self.mode.includes_jira()),
            ("Confluence", &self.confluence, self.mode.includes_confluence()),
        ] {
            if !service.url.is_empty()
                && !service.url.starts_with("http://")
                && !service.url.starts_with("https://")
            {
                return Err(anyhow::anyhow!(
                    "{} URL must start with http:// or https://. Got: {}",
                    name,
                    service.url
                ));
            }

            if included && service.url.is_empty() {
                warn!("{} URL is not configured, {} tools will fail", name, name);
            } else if included && service.personal_token.is_empty() {
                warn!(
                    "{} personal token is not configured, requests need a header token",
                    name
                );
            }
        }

        if !self.enabled_tools.is_empty() && !self.disabled_tools.is_empty() {
            warn!("Both ENABLED_TOOLS and DISABLED_TOOLS are set, DISABLED_TOOLS is ignored");
        }

        info!("Configuration validation successful");
        Ok(())
    }
}
