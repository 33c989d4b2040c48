//! How the host registers the worker.
//!
//! The worker script is served from a fixed path but controls the whole
//! origin, which browsers only allow when the script response carries
//! `Service-Worker-Allowed`. The script itself must never be served stale, or
//! a new generation would not be picked up by the periodic update check.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

pub const SERVICE_WORKER_ALLOWED: &str = "Service-Worker-Allowed";
pub const SCRIPT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";
pub const SCRIPT_CACHE_CONTROL: &str = "public, max-age=0, must-revalidate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegistrationPolicy {
    pub script_path: String,
    pub scope: String,
    pub update_interval_secs: u64,
}

impl RegistrationPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            script_path: config.script_path.clone(),
            scope: config.scope.clone(),
            update_interval_secs: config.update_interval_secs,
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Headers the worker script must be served with.
    pub fn script_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".into(), SCRIPT_CONTENT_TYPE.into()),
            ("Cache-Control".into(), SCRIPT_CACHE_CONTROL.into()),
            (SERVICE_WORKER_ALLOWED.into(), self.scope.clone()),
        ]
    }
}

/// Registration record owned by the host.
///
/// Created when the environment signals it is ready, filled in once the
/// worker is registered, and marked installed when the install signal
/// arrives.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegistrationState {
    policy: RegistrationPolicy,
    /// RFC 3339 timestamps.
    registered_at: Option<String>,
    installed_at: Option<String>,
}

impl RegistrationState {
    pub fn on_ready(policy: RegistrationPolicy) -> Self {
        Self { policy, registered_at: None, installed_at: None }
    }

    pub fn record_registration(&mut self) {
        self.registered_at = Some(Utc::now().to_rfc3339());
        tracing::info!(script = %self.policy.script_path, scope = %self.policy.scope, "worker registered");
    }

    pub fn on_installed(&mut self) {
        self.installed_at = Some(Utc::now().to_rfc3339());
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.policy
    }

    pub fn is_registered(&self) -> bool {
        self.registered_at.is_some()
    }

    pub fn is_installed(&self) -> bool {
        self.installed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_headers() {
        let policy = RegistrationPolicy::from_config(&AppConfig::default());
        let headers = policy.script_headers();
        assert!(headers.contains(&("Service-Worker-Allowed".to_string(), "/".to_string())));
        assert!(headers.contains(&("Content-Type".to_string(), "application/javascript; charset=utf-8".to_string())));
        assert!(headers.contains(&("Cache-Control".to_string(), "public, max-age=0, must-revalidate".to_string())));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RegistrationPolicy::from_config(&AppConfig::default());
        assert_eq!(policy.script_path, "/api/sw");
        assert_eq!(policy.update_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_registration_state_lifecycle() {
        let mut state = RegistrationState::on_ready(RegistrationPolicy::from_config(&AppConfig::default()));
        assert!(!state.is_registered());
        assert!(!state.is_installed());

        state.record_registration();
        state.on_installed();
        assert!(state.is_registered());
        assert!(state.is_installed());
    }
}
