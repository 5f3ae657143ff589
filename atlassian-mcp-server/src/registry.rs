//! Tool registry and visibility filter
//!
//! Maps tool names to their descriptor and handler. Registration happens once
//! at startup; afterwards the registry is shared read-only behind an `Arc` and
//! every transport dispatches through [`ToolRegistry::dispatch`].

use crate::confluence_client::ConfluenceClient;
use crate::context::{InvocationContext, Service};
use crate::credentials::CredentialResolver;
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::jira_client::JiraClient;
use crate::params::{self, ParamSpec, ToolParams};
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Static metadata for one tool
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            params,
        }
    }

    /// MCP `Tool` object as advertised by `tools/list`
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": params::input_schema(&self.params),
        })
    }
}

/// Successful handler payload
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

impl ToolOutput {
    pub fn text(message: impl Into<String>) -> Self {
        ToolOutput::Text(message.into())
    }

    /// Text body sent back to the caller
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Json(value) => value.to_string(),
            ToolOutput::Text(text) => text.clone(),
        }
    }
}

/// Outcome of one dispatch. Never both a payload and an error.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success(ToolOutput),
    Error(String),
}

impl InvocationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, InvocationResult::Error(_))
    }

    pub fn text(&self) -> String {
        match self {
            InvocationResult::Success(output) => output.render(),
            InvocationResult::Error(message) => message.clone(),
        }
    }

    /// MCP `CallToolResult` body
    pub fn to_call_result(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text() }],
            "isError": self.is_error(),
        })
    }
}

/// Enable/disable lists applied to listing and dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    enabled: HashSet<String>,
    disabled: HashSet<String>,
}

impl ToolFilter {
    pub fn new(enabled: &[String], disabled: &[String]) -> Self {
        Self {
            enabled: enabled.iter().cloned().collect(),
            disabled: disabled.iter().cloned().collect(),
        }
    }

    /// Build from comma-separated lists
    pub fn from_lists(enabled: &str, disabled: &str) -> Self {
        Self::new(
            &crate::query::split_and_trim(enabled),
            &crate::query::split_and_trim(disabled),
        )
    }

    /// A non-empty allow-list wins; otherwise the deny-list applies.
    pub fn is_visible(&self, name: &str) -> bool {
        if !self.enabled.is_empty() {
            self.enabled.contains(name)
        } else {
            !self.disabled.contains(name)
        }
    }
}

/// Everything a handler gets for one invocation
pub struct ToolCall {
    pub params: ToolParams,
    pub context: InvocationContext,
    resolver: Arc<CredentialResolver>,
}

impl ToolCall {
    /// Jira client for this call's credentials
    pub fn jira(&self) -> AtlassianMcpResult<JiraClient> {
        let credentials = self.resolver.resolve(Service::Jira, &self.context)?;
        JiraClient::connect(self.resolver.http_client().clone(), &credentials)
    }

    /// Confluence client for this call's credentials
    pub fn confluence(&self) -> AtlassianMcpResult<ConfluenceClient> {
        let credentials = self.resolver.resolve(Service::Confluence, &self.context)?;
        ConfluenceClient::new(self.resolver.http_client().clone(), &credentials)
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = AtlassianMcpResult<ToolOutput>> + Send>>;
type Handler = Arc<dyn Fn(ToolCall) -> HandlerFuture + Send + Sync>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Handler,
}

pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<&'static str, usize>,
    resolver: Arc<CredentialResolver>,
    filter: ToolFilter,
}

impl ToolRegistry {
    pub fn new(resolver: Arc<CredentialResolver>, filter: ToolFilter) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            resolver,
            filter,
        }
    }

    /// Register a tool. Duplicate names and malformed parameter tables are
    /// configuration errors.
    pub fn register<F, Fut>(&mut self, descriptor: ToolDescriptor, handler: F) -> AtlassianMcpResult<()>
    where
        F: Fn(ToolCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AtlassianMcpResult<ToolOutput>> + Send + 'static,
    {
        if self.index.contains_key(descriptor.name) {
            return Err(AtlassianMcpError::config(format!(
                "tool '{}' is registered twice",
                descriptor.name
            )));
        }
        params::validate_specs(descriptor.name, &descriptor.params)?;

        debug!("Registered tool {}", descriptor.name);
        self.index.insert(descriptor.name, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler: Arc::new(move |call| Box::pin(handler(call))),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    fn effective_filter<'a>(&'a self, ctx: &'a InvocationContext) -> &'a ToolFilter {
        ctx.filter.as_ref().unwrap_or(&self.filter)
    }

    /// Visible tools in registration order
    pub fn list(&self, ctx: &InvocationContext) -> Vec<&ToolDescriptor> {
        let filter = self.effective_filter(ctx);
        self.tools
            .iter()
            .map(|tool| &tool.descriptor)
            .filter(|descriptor| filter.is_visible(descriptor.name))
            .collect()
    }

    /// Coerce parameters and run the handler. Errors and panics become an
    /// error result; nothing escapes to the transport.
    pub async fn dispatch(&self, name: &str, arguments: Option<&Value>, ctx: InvocationContext) -> InvocationResult {
        let started = Instant::now();
        match self.try_dispatch(name, arguments, ctx).await {
            Ok(output) => {
                info!(
                    tool = name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                InvocationResult::Success(output)
            }
            Err(e) => {
                error!(tool = name, category = e.category(), "Tool call failed: {}", e);
                InvocationResult::Error(e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, name: &str, arguments: Option<&Value>, ctx: InvocationContext) -> AtlassianMcpResult<ToolOutput> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AtlassianMcpError::ToolNotFound {
                name: name.to_string(),
            })?;

        if !self.effective_filter(&ctx).is_visible(name) {
            return Err(AtlassianMcpError::ToolHidden {
                name: name.to_string(),
            });
        }

        let params = params::coerce(&tool.descriptor.params, arguments)?;
        let call = ToolCall {
            params,
            context: ctx,
            resolver: Arc::clone(&self.resolver),
        };

        let handler = Arc::clone(&tool.handler);
        match AssertUnwindSafe(async move { handler(call).await })
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(AtlassianMcpError::internal(format!(
                    "tool '{}' panicked: {}",
                    name, reason
                )))
            }
        }
    }
}
