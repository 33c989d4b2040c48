//! Control messages posted by the host page, and background sync.

use std::str::FromStr;
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};

use super::{LifecycleState, OfflineWorker};
use crate::Error;

/// Tag of the only background sync the worker answers.
pub const SYNC_DATA_TAG: &str = "sync-data";

/// `{ "type": "SKIP_WAITING" }` or `{ "type": "CLEAR_CACHE" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate now instead of waiting for old clients to close.
    SkipWaiting,
    /// Delete every partition, whatever its generation.
    ClearCache,
}

impl FromStr for ControlMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SKIP_WAITING" => Ok(ControlMessage::SkipWaiting),
            "CLEAR_CACHE" => Ok(ControlMessage::ClearCache),
            other => Err(Error::UnknownMessage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    SkipWaiting { activated: bool },
    CacheCleared { partitions: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncOutcome {
    pub tag: String,
    pub handled: bool,
}

impl OfflineWorker {
    pub async fn handle_message(&self, message: ControlMessage) -> Result<MessageOutcome, Error> {
        match message {
            ControlMessage::SkipWaiting => {
                tracing::info!("received SKIP_WAITING");
                self.skip_waiting.store(true, Ordering::SeqCst);
                let _transition = self.transition.lock().await;
                let activated = if self.state() == LifecycleState::Installed {
                    self.activate_locked().await?;
                    true
                } else {
                    false
                };
                Ok(MessageOutcome::SkipWaiting { activated })
            }
            ControlMessage::ClearCache => {
                tracing::info!("clearing all caches");
                let partitions = self.store.clear_all().await?;
                Ok(MessageOutcome::CacheCleared { partitions })
            }
        }
    }

    /// Background sync. `sync-data` resolves immediately; nothing is queued
    /// for replay yet, so there is no work to do.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        tracing::info!(tag = %tag, "background sync triggered");
        SyncOutcome { tag: tag.to_string(), handled: tag == SYNC_DATA_TAG }
    }
}
