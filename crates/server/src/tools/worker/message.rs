//! worker_message tool implementation.
//!
//! Posts a control message to the worker.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lombasku_core::worker::MessageOutcome;
use lombasku_core::{ControlMessage, Error, EventOutcome, LifecycleState, OfflineWorker, WorkerEvent};

use crate::tools::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message type: "SKIP_WAITING" or "CLEAR_CACHE".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Output from the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    pub message: ControlMessage,
    pub outcome: MessageOutcome,
    /// Lifecycle state after the message was handled.
    pub state: LifecycleState,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &OfflineWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let message: ControlMessage = params.kind.parse()?;

    let outcome = match worker.dispatch(WorkerEvent::Message(message)).await? {
        EventOutcome::Message(outcome) => outcome,
        other => return Err(Error::InvalidState(format!("unexpected outcome for message: {other:?}")).into()),
    };

    json_result(&WorkerMessageOutput { message, outcome, state: worker.state() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, active_worker, output_text, worker};
    use lombasku_core::{PartitionKind, Request, Response};
    use std::sync::Arc;

    fn params(kind: &str) -> WorkerMessageParams {
        WorkerMessageParams { kind: kind.into() }
    }

    #[tokio::test]
    async fn test_message_unknown_type() {
        let worker = active_worker(Arc::new(StubNetwork::default())).await;
        let result = message_impl(&worker, params("RELOAD")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_message_clear_cache_removes_partitions() {
        let network = Arc::new(StubNetwork::default());
        network.respond("http://localhost:3000/", Response::ok("home"));
        let worker = active_worker(network).await;

        let result = message_impl(&worker, params("CLEAR_CACHE")).await.unwrap();
        let output: WorkerMessageOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.message, ControlMessage::ClearCache);
        assert!(matches!(output.outcome, MessageOutcome::CacheCleared { partitions } if partitions >= 1));

        let req = Request::get("http://localhost:3000/").unwrap();
        let hit = worker
            .store()
            .match_in(worker.names().name(PartitionKind::Static), &req)
            .await
            .unwrap();
        assert!(hit.is_none());
        assert!(worker.store().partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_skip_waiting_when_active() {
        let worker = active_worker(Arc::new(StubNetwork::default())).await;

        let result = message_impl(&worker, params("SKIP_WAITING")).await.unwrap();
        let output: WorkerMessageOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.outcome, MessageOutcome::SkipWaiting { activated: false });
        assert_eq!(output.state, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_message_skip_waiting_activates_installed_worker() {
        let worker = worker(Arc::new(StubNetwork::default())).await;
        worker.install().await.unwrap();

        let result = message_impl(&worker, params("SKIP_WAITING")).await.unwrap();
        let output: WorkerMessageOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.outcome, MessageOutcome::SkipWaiting { activated: true });
        assert_eq!(output.state, LifecycleState::Active);
    }
}
