//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;

use lombasku_core::{AppConfig, CacheStore, Error, Network, OfflineWorker, Request, Response};

/// Canned responses by URL; anything else is unreachable.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
}

impl StubNetwork {
    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

pub(crate) async fn worker(network: Arc<StubNetwork>) -> OfflineWorker {
    let store = CacheStore::open_in_memory().await.unwrap();
    OfflineWorker::new(AppConfig::default(), store, network).unwrap()
}

/// Worker that has installed and activated against `network`.
pub(crate) async fn active_worker(network: Arc<StubNetwork>) -> OfflineWorker {
    let worker = worker(network).await;
    worker.start().await.unwrap();
    worker
}

pub(crate) fn output_text(result: &CallToolResult) -> String {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content")
        .to_string()
}
