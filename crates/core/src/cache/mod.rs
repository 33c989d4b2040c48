//! SQLite-backed cache store for intercepted responses.
//!
//! The store holds named partitions, each mapping a request identity
//! (method + URL) to the most recently stored response. It provides:
//!
//! - Partition open/enumerate/delete, in creation order
//! - Upsert and lookup of responses, scoped to one partition or across all
//! - Automatic schema migrations
//! - WAL mode for concurrent access from many in-flight requests

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheStore;
pub use partitions::{CacheNames, PartitionKind};
