//! Install and activate phases.
//!
//! ```text
//! uninstalled -> installing -> installed -> activating -> active
//!                    |                          |
//!                    +-> uninstalled (error)    +-> installed (error)
//! ```
//!
//! Install pre-caches the critical assets into the static partition and always
//! signals skip-waiting. Installing an already active worker only refreshes the
//! pre-cache; the worker stays active and keeps intercepting. Activate deletes every partition that is not one of
//! the current generation's four, then claims the open clients.

use std::fmt;
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};

use super::OfflineWorker;
use crate::Error;
use crate::cache::PartitionKind;
use crate::http::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    /// Installed and idle, waiting to activate.
    Installed,
    Activating,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        };
        f.write_str(s)
    }
}

/// Critical assets that made it into the static partition, and those that didn't.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Partitions removed and kept by activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StartReport {
    pub install: InstallReport,
    /// Present when install's skip-waiting signal triggered activation.
    pub activate: Option<ActivateReport>,
}

impl OfflineWorker {
    /// Install: open the static partition and pre-cache the critical assets.
    ///
    /// Individual asset failures are logged and recorded in the report; they
    /// never fail the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _transition = self.transition.lock().await;
        let refresh = self.state() == LifecycleState::Active;
        if !refresh {
            self.set_state(LifecycleState::Installing);
        }

        let static_name = self.names.name(PartitionKind::Static).to_string();
        if let Err(err) = self.store.open_partition(&static_name).await {
            if !refresh {
                self.set_state(LifecycleState::Uninstalled);
            }
            return Err(err);
        }

        tracing::info!(partition = %static_name, count = self.config.critical_assets.len(), "caching critical assets");
        let mut report = InstallReport::default();
        for asset in &self.config.critical_assets {
            match self.precache(&static_name, asset).await {
                Ok(()) => report.cached.push(asset.clone()),
                Err(err) => {
                    tracing::warn!(asset = %asset, error = %err, "critical asset not cached");
                    report.failed.push(asset.clone());
                }
            }
        }

        if !refresh {
            self.set_state(LifecycleState::Installed);
        }
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(report)
    }

    async fn precache(&self, partition: &str, asset: &str) -> Result<(), Error> {
        let url = self.config.resolve(asset).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = Request::get(url.as_str())?;
        let response = self.strategies.network.fetch(&request).await?;
        if !response.is_cacheable() {
            return Err(Error::Network(format!("status {}", response.status)));
        }
        self.store.put(partition, &request, &response).await
    }

    /// Activate: garbage-collect other generations and claim clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is installed or already
    /// active, and propagates storage failures (reverting to installed).
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let _transition = self.transition.lock().await;
        self.activate_locked().await
    }

    pub(super) async fn activate_locked(&self) -> Result<ActivateReport, Error> {
        let state = self.state();
        if !matches!(state, LifecycleState::Installed | LifecycleState::Active) {
            return Err(Error::InvalidState(format!("cannot activate while {state}")));
        }
        self.set_state(LifecycleState::Activating);

        match self.collect_stale_partitions().await {
            Ok(report) => {
                self.clients_claimed.store(true, Ordering::SeqCst);
                self.set_state(LifecycleState::Active);
                Ok(report)
            }
            Err(err) => {
                self.set_state(LifecycleState::Installed);
                Err(err)
            }
        }
    }

    async fn collect_stale_partitions(&self) -> Result<ActivateReport, Error> {
        let mut report = ActivateReport::default();
        for name in self.store.partition_names().await? {
            if self.names.contains(&name) {
                report.kept.push(name);
            } else {
                tracing::info!(partition = %name, "deleting old cache");
                self.store.delete_partition(&name).await?;
                report.deleted.push(name);
            }
        }
        Ok(report)
    }

    /// Install, then activate immediately if skip-waiting was signalled.
    pub async fn start(&self) -> Result<StartReport, Error> {
        let install = self.install().await?;
        let activate =
            if self.skip_waiting.load(Ordering::SeqCst) { Some(self.activate().await?) } else { None };
        Ok(StartReport { install, activate })
    }
}
