//! Core types and shared functionality for the Lombasku offline worker.
//!
//! This crate provides:
//! - Request/response model and the `Network` seam
//! - Versioned cache partitions with a SQLite backend
//! - Request routing and the per-class caching strategies
//! - Worker lifecycle, control messages and event dispatch
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod router;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheNames, CacheStore, PartitionKind};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Request, RequestMode, Response, ResponseKind, ResponseSource, Served};
pub use network::Network;
pub use router::{Router, Strategy};
pub use worker::{ControlMessage, EventOutcome, FetchOutcome, LifecycleState, OfflineWorker, WorkerEvent};
