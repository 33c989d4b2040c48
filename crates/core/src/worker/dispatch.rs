//! Event dispatch.
//!
//! The host delivers every worker event through [`OfflineWorker::dispatch`],
//! which routes each event kind to its one handler.

use super::{ActivateReport, ControlMessage, FetchOutcome, InstallReport, MessageOutcome, OfflineWorker, SyncOutcome};
use crate::Error;
use crate::http::{Request, Served};
use crate::router::Strategy;

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(ControlMessage),
    Sync { tag: String },
}

impl WorkerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Message(_) => "message",
            WorkerEvent::Sync { .. } => "sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Fetch not intercepted.
    PassThrough,
    Respond { strategy: Strategy, served: Served },
    Installed(InstallReport),
    Activated(ActivateReport),
    Message(MessageOutcome),
    Synced(SyncOutcome),
}

impl OfflineWorker {
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        tracing::trace!(event = event.kind(), "dispatch");
        let outcome = match event {
            WorkerEvent::Install => EventOutcome::Installed(self.install().await?),
            WorkerEvent::Activate => EventOutcome::Activated(self.activate().await?),
            WorkerEvent::Fetch(request) => match self.handle_fetch(&request).await {
                FetchOutcome::PassThrough => EventOutcome::PassThrough,
                FetchOutcome::Respond { strategy, served } => EventOutcome::Respond { strategy, served },
            },
            WorkerEvent::Message(message) => EventOutcome::Message(self.handle_message(message).await?),
            WorkerEvent::Sync { tag } => EventOutcome::Synced(self.handle_sync(&tag).await),
        };
        Ok(outcome)
    }
}
