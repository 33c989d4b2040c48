//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `generation` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `api_prefix`, `offline_page` or `scope` do not start with `/`
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `update_interval_secs` is 0
    ///
    /// Returns `ConfigError::Missing` if `critical_assets` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("cache_prefix", &self.cache_prefix), ("generation", &self.generation)] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(invalid(field, "must not contain whitespace"));
            }
        }

        match url::Url::parse(&self.origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(invalid("origin", &format!("unsupported scheme: {}", url.scheme()))),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        for (field, value) in
            [("api_prefix", &self.api_prefix), ("offline_page", &self.offline_page), ("scope", &self.scope)]
        {
            if !value.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if self.critical_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "critical_assets".into(),
                hint: "list at least the root page and the offline page".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.update_interval_secs == 0 {
            return Err(invalid("update_interval_secs", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.critical_assets.iter().any(|a| a == &self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline_page is not in critical_assets; navigation fallback may be unavailable"
            );
        }

        Ok(())
    }
}
