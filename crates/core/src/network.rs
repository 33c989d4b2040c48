//! The network seam used by every strategy.

use crate::Error;
use crate::http::{Request, Response};

/// Performs the real fetch behind the worker.
///
/// Mirrors browser `fetch()`: any HTTP status, including 4xx/5xx, is `Ok`.
/// Only transport failures (refused connection, DNS, timeout) return
/// `Err(Error::Network)`, and those are what strategies fall back on.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
