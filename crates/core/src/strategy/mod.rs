//! Fetch/cache decision procedures, one per [`Strategy`].
//!
//! ### Strategies
//! - **Document**: network-first; on failure the cached page, then the offline
//!   page, then a 503.
//! - **Api**: network-first into `api` (same-origin prefix) or `dynamic`
//!   (backend hosts); on failure the cached copy, then an offline JSON 503.
//! - **Image**: cache-first; on failure a stale copy, then an SVG placeholder.
//! - **StyleScript**: stale-while-revalidate into `static`; on failure an empty
//!   body of the right content type.
//! - **Default**: network-first into `dynamic`; on failure the cached copy, the
//!   offline page, then a 503.
//!
//! ### Invariants
//! - Only 200 responses are stored, always as a detached copy; the caller never
//!   waits on persistence and never sees a persistence error.
//! - Every path yields a response.

pub mod fallback;
pub mod persist;

use std::sync::Arc;

use crate::cache::{CacheNames, CacheStore, PartitionKind};
use crate::http::{Request, Response, Served};
use crate::network::Network;
use crate::router::{Router, Strategy};

pub use persist::PendingWrites;

/// Shared state every strategy runs against.
#[derive(Clone)]
pub struct StrategyContext {
    pub(crate) store: CacheStore,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) names: CacheNames,
    pub(crate) router: Router,
    pub(crate) offline_page: Request,
    pub(crate) writes: Arc<PendingWrites>,
}

impl StrategyContext {
    pub fn new(
        store: CacheStore, network: Arc<dyn Network>, names: CacheNames, router: Router, offline_page: Request,
        writes: Arc<PendingWrites>,
    ) -> Self {
        Self { store, network, names, router, offline_page, writes }
    }

    /// Run the strategy for a classified request.
    pub async fn run(&self, strategy: Strategy, request: &Request) -> Served {
        tracing::debug!(url = %request.url, ?strategy, "intercepted");
        match strategy {
            Strategy::Document => self.document(request).await,
            Strategy::Api => self.api(request).await,
            Strategy::Image => self.image(request).await,
            Strategy::StyleScript => self.stale_while_revalidate(request).await,
            Strategy::Default => self.network_first(request).await,
        }
    }

    async fn document(&self, request: &Request) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(PartitionKind::Static, request, &response);
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "document fetch failed");
                if let Some(hit) = self.lookup(request).await {
                    return Served::cache(hit);
                }
                match self.lookup(&self.offline_page).await {
                    Some(page) => Served::fallback(page),
                    None => Served::fallback(fallback::page_unavailable()),
                }
            }
        }
    }

    async fn api(&self, request: &Request) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => {
                let kind = if self.router.is_api_path(request) { PartitionKind::Api } else { PartitionKind::Dynamic };
                self.store_copy(kind, request, &response);
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "api fetch failed");
                match self.lookup(request).await {
                    Some(hit) => {
                        tracing::debug!(url = %request.url, "returning cached api response");
                        Served::cache(hit)
                    }
                    None => Served::fallback(fallback::api_unavailable()),
                }
            }
        }
    }

    async fn image(&self, request: &Request) -> Served {
        if let Some(hit) = self.lookup(request).await {
            return Served::cache(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(PartitionKind::Images, request, &response);
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "image fetch failed");
                match self.lookup(request).await {
                    Some(stale) => Served::cache(stale),
                    None => Served::fallback(fallback::image_placeholder()),
                }
            }
        }
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Served {
        let cached = self.lookup(request).await;

        let (tx, rx) = tokio::sync::oneshot::channel();
        let ctx = self.clone();
        let revalidate = request.clone();
        self.writes.spawn(async move {
            match ctx.network.fetch(&revalidate).await {
                Ok(response) => {
                    ctx.store_copy(PartitionKind::Static, &revalidate, &response);
                    let _ = tx.send(Some(response));
                }
                Err(err) => {
                    tracing::debug!(url = %revalidate.url, error = %err, "revalidation failed");
                    let _ = tx.send(None);
                }
            }
        });

        if let Some(hit) = cached {
            return Served::cache(hit);
        }

        match rx.await {
            Ok(Some(response)) => Served::network(response),
            _ => Served::fallback(fallback::empty_asset(request.destination)),
        }
    }

    async fn network_first(&self, request: &Request) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(PartitionKind::Dynamic, request, &response);
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "fetch failed");
                if let Some(hit) = self.lookup(request).await {
                    tracing::debug!(url = %request.url, "returning cached response");
                    return Served::cache(hit);
                }
                match self.lookup(&self.offline_page).await {
                    Some(page) => Served::fallback(page),
                    None => Served::fallback(fallback::resource_unavailable()),
                }
            }
        }
    }

    /// Unscoped cache match. Storage errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.store.match_any(request).await {
            Ok(hit) => {
                tracing::debug!(url = %request.url, hit = hit.is_some(), "cache lookup");
                hit
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "cache lookup failed");
                None
            }
        }
    }

    /// Persist a copy of a 200 response without blocking the caller.
    fn store_copy(&self, kind: PartitionKind, request: &Request, response: &Response) {
        if !response.is_cacheable() {
            return;
        }
        let store = self.store.clone();
        let partition = self.names.name(kind).to_string();
        let request = request.clone();
        let response = response.clone();
        self.writes.spawn(async move {
            if let Err(err) = store.put(&partition, &request, &response).await {
                tracing::debug!(partition = %partition, url = %request.url, error = %err, "cache write dropped");
            }
        });
    }
}
