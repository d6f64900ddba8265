//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::events::{NotificationClickParams, PushParams, SyncParams, click_impl, push_impl, sync_impl};
use crate::tools::lifecycle::{ControlMessageParams, activate_impl, control_impl, install_impl};
use crate::tools::partitions::list_impl;
use crate::tools::resource::{ResourceFetchParams, fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for shelter.
#[derive(Clone)]
pub struct ShelterServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShelterServer {
    /// Create a new server handler over shared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    /// Handle one resource request through the caching strategies.
    ///
    /// The request is classified and routed to cache-first, network-first or
    /// network-only handling; offline fallbacks are returned as responses.
    #[tool(
        description = "Fetch a resource through the offline cache layer. Returns status, headers and body, served from cache or a fallback when the network is unavailable."
    )]
    async fn resource_fetch(&self, params: Parameters<ResourceFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Pre-warm the static shell and third-party partitions. Fails if any static asset is unavailable.")]
    async fn lifecycle_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.state).await
    }

    #[tool(description = "Delete partitions from other cache versions and claim open clients.")]
    async fn lifecycle_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    #[tool(description = "Send a control message: {\"action\": \"skipWaiting\" | \"clearCache\" | \"cacheCDN\"}.")]
    async fn control_message(&self, params: Parameters<ControlMessageParams>) -> Result<CallToolResult, McpError> {
        control_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache partitions with entry counts and whether each is current, plus open clients.")]
    async fn partitions_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.state).await
    }

    #[tool(description = "Deliver a push payload and display its notification.")]
    async fn push_notification(&self, params: Parameters<PushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.state, params.0).await
    }

    #[tool(description = "Handle a notification click by opening its URL.")]
    async fn notification_click(&self, params: Parameters<NotificationClickParams>) -> Result<CallToolResult, McpError> {
        click_impl(&self.state, params.0).await
    }

    #[tool(description = "Fire a background sync event. Only the configured sync tag is handled.")]
    async fn background_sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.state, params.0).await
    }
}

impl ServerHandler for ShelterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shelter".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
