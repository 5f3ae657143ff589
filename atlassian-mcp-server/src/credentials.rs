//! Credential resolution
//!
//! Combines the process-wide base URL with either the per-request override
//! token or the configured fallback token.

use crate::config::{AtlassianConfig, ServiceConfig};
use crate::context::{InvocationContext, Service};
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use std::sync::Arc;
use tracing::debug;

/// Resolved base URL and bearer token for one service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub service: Service,
    pub base_url: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("service", &self.service)
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    config: Arc<AtlassianConfig>,
    http: reqwest::Client,
}

impl CredentialResolver {
    pub fn new(config: Arc<AtlassianConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Shared connection pool for the clients built per call
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    fn service_config(&self, service: Service) -> &ServiceConfig {
        match service {
            Service::Jira => &self.config.jira,
            Service::Confluence => &self.config.confluence,
        }
    }

    /// Resolve credentials for `service`; the context token wins over the configured one.
    pub fn resolve(&self, service: Service, ctx: &InvocationContext) -> AtlassianMcpResult<Credentials> {
        let service_config = self.service_config(service);
        let base_url = service_config.url.trim().trim_end_matches('/').to_string();

        let token = match ctx.token_for(service) {
            Some(token) => {
                debug!(%service, "Using per-request token");
                token.to_string()
            }
            None => service_config.personal_token.clone(),
        };

        if base_url.is_empty() || token.is_empty() {
            return Err(AtlassianMcpError::credentials(
                service.to_string(),
                format!(
                    "missing {} credentials (base URL and personal token are required)",
                    service
                ),
            ));
        }

        Ok(Credentials {
            service,
            base_url,
            token,
        })
    }
}
