//! Worker control MCP tools.
//!
//! This module provides tools for driving the worker's non-fetch events and
//! inspecting its caches.

pub mod message;
pub mod status;
pub mod sync;

pub use message::{WorkerMessageParams, message_impl};
pub use status::{CacheStatusParams, status_impl};
pub use sync::{BackgroundSyncParams, sync_impl};
