//! Confluence REST client
//!
//! Endpoints are written in their cloud form (`/wiki/rest/api/...`). The
//! leading `/wiki` segment is stripped before the endpoint is appended to the
//! base URL path, so the same handlers work against on-premises instances.

use crate::credentials::Credentials;
use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use crate::response;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl ConfluenceClient {
    pub fn new(http: reqwest::Client, credentials: &Credentials) -> AtlassianMcpResult<Self> {
        let base_url = Url::parse(&credentials.base_url).map_err(|e| {
            AtlassianMcpError::credentials(
                "Confluence",
                format!("invalid Confluence URL '{}': {}", credentials.base_url, e),
            )
        })?;

        Ok(Self {
            http,
            base_url,
            token: credentials.token.clone(),
        })
    }

    /// Absolute URL for an endpoint such as `/wiki/rest/api/content/1`.
    pub fn url_for(&self, endpoint: &str) -> Url {
        let (path, query) = match endpoint.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (endpoint, None),
        };

        let base_path = self.base_url.path().trim_end_matches('/');
        let endpoint_path = strip_wiki_prefix(&format!("/{}", path.trim_start_matches('/')));
        let joined = format!("{}{}", base_path, endpoint_path);

        let mut url = self.base_url.clone();
        url.set_path(&joined);
        url.set_query(query);
        url
    }

    #[instrument(skip(self, query))]
    pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> AtlassianMcpResult<Value> {
        let request = self.request(Method::GET, endpoint)?.query(query);
        self.send(request).await
    }

    #[instrument(skip(self, body))]
    pub async fn post(&self, endpoint: &str, body: Value) -> AtlassianMcpResult<Value> {
        let request = self.request(Method::POST, endpoint)?.json(&body);
        self.send(request).await
    }

    #[instrument(skip(self, body))]
    pub async fn put(&self, endpoint: &str, body: Value) -> AtlassianMcpResult<Value> {
        let request = self.request(Method::PUT, endpoint)?.json(&body);
        self.send(request).await
    }

    #[instrument(skip(self, query))]
    pub async fn delete(&self, endpoint: &str, query: &[(&str, String)]) -> AtlassianMcpResult<Value> {
        let request = self.request(Method::DELETE, endpoint)?.query(query);
        self.send(request).await
    }

    fn request(&self, method: Method, endpoint: &str) -> AtlassianMcpResult<RequestBuilder> {
        let url = self.url_for(endpoint);
        debug!("{} {}", method, url.path());
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> AtlassianMcpResult<Value> {
        let response = request.send().await?;
        response::json_body(response, "Confluence request failed").await
    }
}

/// Drop one leading `/wiki` path segment, if present.
fn strip_wiki_prefix(path: &str) -> String {
    match path.strip_prefix("/wiki") {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Service;

    fn client(base: &str) -> ConfluenceClient {
        let credentials = Credentials {
            service: Service::Confluence,
            base_url: base.to_string(),
            token: "t".to_string(),
        };
        ConfluenceClient::new(reqwest::Client::new(), &credentials).unwrap()
    }

    #[test]
    fn test_wiki_prefix_is_stripped_once() {
        assert_eq!(strip_wiki_prefix("/wiki/rest/api/search"), "/rest/api/search");
        assert_eq!(strip_wiki_prefix("/wiki/wiki/x"), "/wiki/x");
        assert_eq!(strip_wiki_prefix("/wikipedia/x"), "/wikipedia/x");
        assert_eq!(strip_wiki_prefix("/wiki"), "/");
    }

    #[test]
    fn test_url_for_root_instance() {
        let url = client("https://confluence.example.com")
            .url_for("/wiki/rest/api/content/42?expand=version");
        assert_eq!(
            url.as_str(),
            "https://confluence.example.com/rest/api/content/42?expand=version"
        );
    }

    #[test]
    fn test_url_for_context_path() {
        let url = client("https://example.com/confluence/")
            .url_for("/wiki/rest/api/search");
        assert_eq!(url.as_str(), "https://example.com/confluence/rest/api/search");
    }

    #[test]
    fn test_wiki_in_base_url_is_kept() {
        let url = client("https://example.com/wiki").url_for("/wiki/rest/api/search");
        assert_eq!(url.as_str(), "https://example.com/wiki/rest/api/search");
    }

    #[test]
    fn test_invalid_base_url() {
        let credentials = Credentials {
            service: Service::Confluence,
            base_url: "not a url".to_string(),
            token: "t".to_string(),
        };
        assert!(ConfluenceClient::new(reqwest::Client::new(), &credentials).is_err());
    }
}
