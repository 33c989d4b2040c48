//! cache_status tool implementation.
//!
//! Reports lifecycle state, live partitions and registration details.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lombasku_core::worker::RegistrationState;
use lombasku_core::{LifecycleState, OfflineWorker};

use crate::tools::{Header, json_result};

/// Parameters for the cache_status tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionStatus {
    pub name: String,
    pub entries: u64,
    /// Whether the partition belongs to the running generation.
    pub current: bool,
}

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    pub state: LifecycleState,
    pub clients_claimed: bool,
    pub generation: String,
    pub partitions: Vec<PartitionStatus>,
    pub registration: RegistrationState,
    /// Headers the worker script is served with.
    pub script_headers: Vec<Header>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(
    worker: &OfflineWorker, registration: &RegistrationState, _params: CacheStatusParams,
) -> Result<CallToolResult, McpError> {
    let mut partitions = Vec::new();
    for name in worker.store().partition_names().await? {
        let entries = worker.store().entry_count(&name).await?;
        let current = worker.names().contains(&name);
        partitions.push(PartitionStatus { name, entries, current });
    }

    let output = CacheStatusOutput {
        state: worker.state(),
        clients_claimed: worker.clients_claimed(),
        generation: worker.names().generation().to_string(),
        partitions,
        registration: registration.clone(),
        script_headers: Header::from_pairs(&registration.policy().script_headers()),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, active_worker, output_text, worker};
    use lombasku_core::worker::RegistrationPolicy;
    use lombasku_core::{Request, Response};
    use std::sync::Arc;

    fn registration(worker: &OfflineWorker) -> RegistrationState {
        let mut state = RegistrationState::on_ready(RegistrationPolicy::from_config(worker.config()));
        state.record_registration();
        state
    }

    async fn status(worker: &OfflineWorker) -> CacheStatusOutput {
        let result = status_impl(worker, &registration(worker), CacheStatusParams::default())
            .await
            .unwrap();
        serde_json::from_str(&output_text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_status_uninstalled() {
        let worker = worker(Arc::new(StubNetwork::default())).await;
        let output = status(&worker).await;

        assert_eq!(output.state, LifecycleState::Uninstalled);
        assert!(!output.clients_claimed);
        assert_eq!(output.generation, "v3");
        assert!(output.partitions.is_empty());
        assert!(output.registration.is_registered());
    }

    #[tokio::test]
    async fn test_status_after_start_lists_static_partition() {
        let network = Arc::new(StubNetwork::default());
        network.respond("http://localhost:3000/", Response::ok("home"));
        network.respond("http://localhost:3000/offline.html", Response::ok("offline"));
        let worker = active_worker(network).await;

        let output = status(&worker).await;
        assert_eq!(output.state, LifecycleState::Active);
        assert!(output.clients_claimed);

        let static_partition = output
            .partitions
            .iter()
            .find(|p| p.name == "lombasku-static-v3")
            .expect("static partition");
        assert_eq!(static_partition.entries, 2);
        assert!(static_partition.current);
    }

    #[tokio::test]
    async fn test_status_flags_foreign_generation() {
        let worker = active_worker(Arc::new(StubNetwork::default())).await;
        let req = Request::get("http://localhost:3000/old.css").unwrap();
        worker
            .store()
            .put("lombasku-static-v2", &req, &Response::ok("old"))
            .await
            .unwrap();

        let output = status(&worker).await;
        let stale = output
            .partitions
            .iter()
            .find(|p| p.name == "lombasku-static-v2")
            .expect("old partition");
        assert!(!stale.current);
        assert_eq!(stale.entries, 1);
    }

    #[tokio::test]
    async fn test_status_reports_script_headers() {
        let worker = worker(Arc::new(StubNetwork::default())).await;
        let output = status(&worker).await;

        assert!(output.script_headers.contains(&Header {
            name: "Service-Worker-Allowed".into(),
            value: "/".into()
        }));
    }
}
