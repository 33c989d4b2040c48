//! MCP tool implementations.
//!
//! This module contains all tools exposed by the lombasku-offline server.

pub mod fetch;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::model::CallToolResult;
use rmcp::{ErrorData as McpError, model::Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lombasku_core::Error;

pub use fetch::{OfflineFetchParams, fetch_impl};
pub use worker::{BackgroundSyncParams, CacheStatusParams, WorkerMessageParams, message_impl, status_impl, sync_impl};

/// A single response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub(crate) fn from_pairs(pairs: &[(String, String)]) -> Vec<Header> {
        pairs
            .iter()
            .map(|(name, value)| Header { name: name.clone(), value: value.clone() })
            .collect()
    }
}

/// Serialize a tool output as the single text content of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
