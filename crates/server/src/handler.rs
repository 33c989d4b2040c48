//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    BackgroundSyncParams, CacheStatusParams, OfflineFetchParams, WorkerMessageParams, fetch_impl, message_impl,
    status_impl, sync_impl,
};

use lombasku_core::worker::RegistrationState;
use lombasku_core::{Network, OfflineWorker};
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

/// The main MCP server handler for lombasku-offline.
#[derive(Clone)]
pub struct LombaskuServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<OfflineWorker>,
    /// Used for requests the worker does not intercept.
    network: Arc<dyn Network>,
    registration: Arc<RegistrationState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl LombaskuServer {
    /// Create a new server handler.
    pub fn new(worker: Arc<OfflineWorker>, network: Arc<dyn Network>, registration: RegistrationState) -> Self {
        Self { tool_router: Self::tool_router(), worker, network, registration: Arc::new(registration) }
    }

    #[tool(
        description = "Fetch a URL through the offline worker. Returns status, headers, body, the caching strategy used and whether the response came from the network, the cache or an offline fallback."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Post a control message to the worker: SKIP_WAITING activates a waiting worker, CLEAR_CACHE deletes every cache partition.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Trigger a background sync event. The worker handles the \"sync-data\" tag.")]
    async fn background_sync(&self, params: Parameters<BackgroundSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the worker lifecycle state, cache partitions with entry counts, and registration details.")]
    async fn cache_status(&self, params: Parameters<CacheStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, &self.registration, params.0).await
    }
}

impl ServerHandler for LombaskuServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "lombasku-offline".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, worker};
    use lombasku_core::worker::RegistrationPolicy;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let network = Arc::new(StubNetwork::default());
        let worker = Arc::new(worker(network.clone()).await);
        let registration = RegistrationState::on_ready(RegistrationPolicy::from_config(worker.config()));
        let server = LombaskuServer::new(worker, network, registration);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["background_sync", "cache_status", "offline_fetch", "worker_message"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let network = Arc::new(StubNetwork::default());
        let worker = Arc::new(worker(network.clone()).await);
        let registration = RegistrationState::on_ready(RegistrationPolicy::from_config(worker.config()));
        let server = LombaskuServer::new(worker, network, registration);

        assert_eq!(server.get_info().server_info.name, "lombasku-offline");
    }
}
