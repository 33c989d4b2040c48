//! offline_fetch tool implementation.
//!
//! Offers a request to the worker the way a page's fetch would reach it. When
//! the worker declines (not a GET, or not active yet) the request goes straight
//! to the network, as it would without a worker installed.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lombasku_client::canonicalize;
use lombasku_core::{
    Destination, Error, EventOutcome, Network, OfflineWorker, Request, RequestMode, ResponseSource, Served, Strategy,
    WorkerEvent,
};

use super::{Header, json_result};

/// Input parameters for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute URL, or a path resolved against the controlled origin.
    pub url: String,

    /// HTTP method (default: "GET").
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Request destination, e.g. "document", "image", "style", "script".
    #[serde(default)]
    pub destination: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    pub url: String,
    /// Whether the worker produced the response.
    pub intercepted: bool,
    /// Strategy that handled the request, if intercepted.
    pub strategy: Option<Strategy>,
    pub source: ResponseSource,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<Header>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the offline_fetch tool.
pub async fn fetch_impl(
    worker: &OfflineWorker, network: &dyn Network, params: OfflineFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;

    let (strategy, served) = match worker.dispatch(WorkerEvent::Fetch(request.clone())).await? {
        EventOutcome::Respond { strategy, served } => (Some(strategy), served),
        EventOutcome::PassThrough => {
            tracing::debug!(method = %request.method, url = %request.url, "passing through to network");
            (None, Served::network(network.fetch(&request).await?))
        }
        other => {
            return Err(Error::InvalidState(format!("unexpected outcome for fetch: {other:?}")).into());
        }
    };

    let response = served.response;
    let output = OfflineFetchOutput {
        url: request.url.to_string(),
        intercepted: strategy.is_some(),
        strategy,
        source: served.source,
        status: response.status,
        status_text: response.status_text.clone(),
        headers: Header::from_pairs(&response.headers),
        body: response.body_text(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}

fn build_request(worker: &OfflineWorker, params: &OfflineFetchParams) -> Result<Request, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let origin = worker
        .config()
        .resolve("/")
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let url = canonicalize(&params.url, &origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::new(&params.method, url.as_str())?;
    if let Some(mode) = params.mode.as_deref() {
        request = request.with_mode(mode.parse::<RequestMode>()?);
    }
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(destination.parse::<Destination>()?);
    }

    Ok(request)
}
