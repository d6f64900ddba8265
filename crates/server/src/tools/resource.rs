//! resource_fetch tool implementation.
//!
//! Routes one request through the strategy router, exactly as an
//! intercepted page request would be handled.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::request::resolve;
use shelter_core::{Destination, Request, Response};

use super::json_result;
use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Non-GET requests bypass the cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: document, image, style, script, font, manifest.
    #[serde(default)]
    pub destination: Option<String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, forwarded for pass-through requests.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

/// Output from the resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFetchOutput {
    /// Canonical URL that was handled.
    pub url: String,
    pub method: String,
    /// Handling class, or `passthrough` when the request bypassed the cache.
    pub class: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<HeaderEntry>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl ResourceFetchOutput {
    fn new(request: &Request, class: String, response: Response) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.clone(),
            class,
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            headers: response
                .headers
                .iter()
                .map(|(name, value)| HeaderEntry { name: name.clone(), value: value.clone() })
                .collect(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

/// Implementation of the resource_fetch tool.
pub async fn fetch_impl(state: &AppState, params: ResourceFetchParams) -> Result<CallToolResult, McpError> {
    let raw = params.url.trim();
    if raw.is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let method = params.method.trim();
    if method.is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let origin = state.config.origin_url().map_err(shelter_core::Error::from)?;
    let url = resolve(&origin, raw).map_err(shelter_core::Error::from)?;
    let destination = params.destination.as_deref().map(Destination::parse).unwrap_or_default();

    let mut request = Request::from_url(method, url, destination);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let class = state
        .router
        .classifier()
        .classify(&request)
        .class()
        .map_or_else(|| "passthrough".to_string(), |c| c.as_str().to_string());

    let response = state.router.handle(&request).await?;
    json_result(&ResourceFetchOutput::new(&request, class, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{StaticNetwork, output, state};

    fn params(url: &str) -> ResourceFetchParams {
        ResourceFetchParams {
            url: url.into(),
            method: default_method(),
            destination: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_impl_empty_url() {
        let state = state(StaticNetwork::default());
        let result = fetch_impl(&state, params("   ")).await;
        assert_eq!(result.unwrap_err().code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_impl_resolves_path_against_origin() {
        let network =
            StaticNetwork::default().with("https://notes.app/notes", Response::new(200).with_body("<p>notes</p>"));
        let state = state(network);

        let result = fetch_impl(&state, params("/notes")).await.unwrap();
        let out = output(&result);
        assert_eq!(out["url"], "https://notes.app/notes");
        assert_eq!(out["class"], "page");
        assert_eq!(out["status"], 200);
        assert_eq!(out["body"], "<p>notes</p>");
    }

    #[tokio::test]
    async fn test_fetch_impl_api_offline_payload() {
        let state = state(StaticNetwork::default());

        let result = fetch_impl(&state, params("/api/notes")).await.unwrap();
        let out = output(&result);
        assert_eq!(out["class"], "api");
        assert_eq!(out["status"], 503);
        let body: serde_json::Value = serde_json::from_str(out["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["offline"], true);
    }

    #[tokio::test]
    async fn test_fetch_impl_image_placeholder() {
        let state = state(StaticNetwork::default());
        let mut p = params("/img/logo.png");
        p.destination = Some("image".into());

        let result = fetch_impl(&state, p).await.unwrap();
        let out = output(&result);
        assert_eq!(out["class"], "image");
        assert_eq!(out["status"], 404);
        assert_eq!(out["body"], "Image not available");
    }

    #[tokio::test]
    async fn test_fetch_impl_passthrough_error_propagates() {
        let state = state(StaticNetwork::default());
        let mut p = params("/api/notes");
        p.method = "POST".into();
        p.body = Some("{}".into());

        let err = fetch_impl(&state, p).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }
}
