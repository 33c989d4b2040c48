//! background_sync tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lombasku_core::{Error, EventOutcome, OfflineWorker, WorkerEvent};

use crate::tools::json_result;

/// Parameters for the background_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundSyncParams {
    /// Sync tag; the worker handles "sync-data".
    pub tag: String,
}

/// Implementation of the background_sync tool.
pub async fn sync_impl(worker: &OfflineWorker, params: BackgroundSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.trim();
    if tag.is_empty() {
        return Err(Error::InvalidInput("tag cannot be empty".into()).into());
    }

    match worker.dispatch(WorkerEvent::Sync { tag: tag.to_string() }).await? {
        EventOutcome::Synced(outcome) => json_result(&outcome),
        other => Err(Error::InvalidState(format!("unexpected outcome for sync: {other:?}")).into()),
    }
}
