//! JIRA client wrapper around gouqi
//!
//! A short-lived handle built per invocation from resolved credentials.
//! gouqi's `ClientCore` builds the URLs and applies the credentials; requests
//! go out on the shared reqwest pool so every non-2xx status is seen.
//! Responses are relayed as raw JSON; the handlers decide what to keep.

use crate::credentials::Credentials;
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::response;
use gouqi::ClientCore;
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Which gouqi API root an endpoint lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiraApi {
    /// `/rest/api/latest`
    Rest,
    /// `/rest/agile/latest`
    Agile,
}

impl JiraApi {
    fn name(self) -> &'static str {
        match self {
            JiraApi::Rest => "api",
            JiraApi::Agile => "agile",
        }
    }
}

/// JIRA client wrapper used by the tool handlers
pub struct JiraClient {
    http: reqwest::Client,
    core: ClientCore,
    credentials: Credentials,
}

impl JiraClient {
    /// Build a client for one invocation
    pub fn connect(http: reqwest::Client, credentials: &Credentials) -> AtlassianMcpResult<Self> {
        let core = ClientCore::new(
            credentials.base_url.as_str(),
            gouqi::Credentials::Bearer(credentials.token.clone()),
        )
        .map_err(|e| {
            AtlassianMcpError::credentials("Jira", format!("failed to create Jira client: {}", e))
        })?;

        Ok(Self {
            http,
            core,
            credentials: credentials.clone(),
        })
    }

    #[instrument(skip(self), fields(api = api.name()))]
    pub async fn get(&self, api: JiraApi, endpoint: &str) -> AtlassianMcpResult<Value> {
        self.send(Method::GET, api, endpoint, None).await
    }

    #[instrument(skip(self, body), fields(api = api.name()))]
    pub async fn post(&self, api: JiraApi, endpoint: &str, body: Value) -> AtlassianMcpResult<Value> {
        self.send(Method::POST, api, endpoint, Some(body)).await
    }

    #[instrument(skip(self, body), fields(api = api.name()))]
    pub async fn put(&self, api: JiraApi, endpoint: &str, body: Value) -> AtlassianMcpResult<Value> {
        self.send(Method::PUT, api, endpoint, Some(body)).await
    }

    #[instrument(skip(self), fields(api = api.name()))]
    pub async fn delete(&self, api: JiraApi, endpoint: &str) -> AtlassianMcpResult<Value> {
        self.send(Method::DELETE, api, endpoint, None).await
    }

    async fn send(
        &self,
        method: Method,
        api: JiraApi,
        endpoint: &str,
        body: Option<Value>,
    ) -> AtlassianMcpResult<Value> {
        let endpoint = apply_user_lookup_shim(endpoint);
        let url = self.core.build_url(api.name(), &endpoint)?;
        debug!("{} {}", method, url.path());

        let mut request = self
            .core
            .apply_credentials_async(self.http.request(method, url))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        response::json_body(response, "Jira request failed").await
    }

    /// Attach already-read files to an issue.
    ///
    /// gouqi only exposes uploads on its sync client, so this runs on the
    /// blocking pool.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_attachments(&self, issue_key: &str, files: Vec<(String, Vec<u8>)>) -> AtlassianMcpResult<usize> {
        let base_url = self.credentials.base_url.clone();
        let token = self.credentials.token.clone();
        let issue_key = issue_key.to_string();

        let uploaded = tokio::task::spawn_blocking(move || {
            let sync_client = gouqi::Jira::new(&base_url, gouqi::Credentials::Bearer(token))?;

            let files_for_upload: Vec<(&str, Vec<u8>)> = files
                .iter()
                .map(|(name, bytes)| (name.as_str(), bytes.clone()))
                .collect();

            sync_client
                .issues()
                .upload_attachment(&issue_key, files_for_upload)
        })
        .await
        .map_err(|e| AtlassianMcpError::internal(format!("Task join error: {}", e)))??;

        info!("Uploaded {} attachment(s)", uploaded.len());
        Ok(uploaded.len())
    }
}

/// Read attachment files from disk, keyed by file name.
pub async fn read_attachments(paths: &[PathBuf]) -> AtlassianMcpResult<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AtlassianMcpError::invalid_param(
                "attachments",
                format!("cannot read '{}': {}", path.display(), e),
            )
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push((name, bytes));
    }
    Ok(files)
}

/// Rewrite `accountId=` to `username=` on user lookups.
///
/// Server and Data Center deployments only understand the legacy name.
pub fn apply_user_lookup_shim(endpoint: &str) -> String {
    let Some((path, query)) = endpoint.split_once('?') else {
        return endpoint.to_string();
    };
    if !path.starts_with("/user") {
        return endpoint.to_string();
    }

    let rewritten: Vec<String> = query
        .split('&')
        .map(|pair| match pair.strip_prefix("accountId=") {
            Some(value) => format!("username={}", value),
            None => pair.to_string(),
        })
        .collect();

    format!("{}?{}", path, rewritten.join("&"))
}
