//! In-process network double for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Error;
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::http::{Request, Response};
use crate::network::Network;
use crate::worker::OfflineWorker;

/// Serves canned responses by URL; unknown URLs fail like an unreachable host.
#[derive(Default)]
pub(crate) struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

/// Default-config worker over an in-memory store.
pub(crate) async fn worker_with(network: Arc<MockNetwork>) -> OfflineWorker {
    let store = CacheStore::open_in_memory().await.unwrap();
    OfflineWorker::new(AppConfig::default(), store, network).unwrap()
}
