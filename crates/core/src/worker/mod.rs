//! The intercepting worker.
//!
//! [`OfflineWorker`] owns the cache store, the router and the strategies, and
//! moves through the install/activate lifecycle. Requests are intercepted only
//! once the worker is active; until then, and for anything that is not a GET,
//! the caller is told to pass the request through untouched.

pub mod dispatch;
pub mod lifecycle;
pub mod message;
pub mod registration;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};

use crate::Error;
use crate::cache::{CacheNames, CacheStore};
use crate::config::AppConfig;
use crate::http::{Request, Served};
use crate::network::Network;
use crate::router::{Router, Strategy};
use crate::strategy::{PendingWrites, StrategyContext};

pub use dispatch::{EventOutcome, WorkerEvent};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleState, StartReport};
pub use message::{ControlMessage, MessageOutcome, SYNC_DATA_TAG, SyncOutcome};
pub use registration::{RegistrationPolicy, RegistrationState};

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller performs the request itself.
    PassThrough,
    /// Substitute response produced by a strategy.
    Respond { strategy: Strategy, served: Served },
}

pub struct OfflineWorker {
    config: AppConfig,
    store: CacheStore,
    names: CacheNames,
    router: Router,
    strategies: StrategyContext,
    writes: Arc<PendingWrites>,
    state: watch::Sender<LifecycleState>,
    transition: Mutex<()>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl OfflineWorker {
    /// Create an uninstalled worker.
    pub fn new(config: AppConfig, store: CacheStore, network: Arc<dyn Network>) -> Result<Self, Error> {
        let offline_url = config
            .resolve(&config.offline_page)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let offline_page = Request::get(offline_url.as_str())?;
        let names = config.cache_names();
        let router = Router::new(&config);
        let writes = Arc::new(PendingWrites::new());
        let strategies =
            StrategyContext::new(store.clone(), network, names.clone(), router.clone(), offline_page, writes.clone());
        let (state, _) = watch::channel(LifecycleState::Uninstalled);

        Ok(Self {
            config,
            store,
            names,
            router,
            strategies,
            writes,
            state,
            transition: Mutex::new(()),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Partition names of this worker's generation.
    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Whether activation has claimed the open clients.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Offer an intercepted request to the worker.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        let Some(strategy) = self.router.classify(request) else {
            return FetchOutcome::PassThrough;
        };
        if self.state() != LifecycleState::Active {
            tracing::debug!(url = %request.url, state = %self.state(), "worker not active; passing through");
            return FetchOutcome::PassThrough;
        }

        let served = self.strategies.run(strategy, request).await;
        FetchOutcome::Respond { strategy, served }
    }

    /// Wait for detached cache writes and background refreshes to finish.
    pub async fn settle(&self) {
        self.writes.settle().await;
    }

    fn set_state(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::info!(from = %prev, to = %next, generation = %self.names.generation(), "lifecycle transition");
        }
    }
}
