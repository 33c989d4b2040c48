//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LOMBASKU_*)
//! 2. TOML config file (if LOMBASKU_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheNames;

mod validation;

pub use validation::ConfigError;

/// Offline worker configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LOMBASKU_*)
/// 2. TOML config file (if LOMBASKU_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via LOMBASKU_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every partition name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Cache generation tag. Bumping it invalidates all prior partitions on
    /// the next activation.
    ///
    /// Set via LOMBASKU_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Origin the worker controls; relative asset paths resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths pre-cached into the static partition on install, in order.
    #[serde(default = "default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// Page served when a navigation fails and nothing is cached.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path prefix identifying same-origin API calls.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Host substrings identifying backend-service calls.
    #[serde(default = "default_backend_host_patterns")]
    pub backend_host_patterns: Vec<String>,

    /// File extensions routed to the image strategy (case-insensitive).
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    ///
    /// Set via LOMBASKU_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Path the worker script is served from.
    #[serde(default = "default_script_path")]
    pub script_path: String,

    /// Registration scope.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// How often the host page polls for a new worker script, in seconds.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./lombasku-cache.sqlite")
}

fn default_cache_prefix() -> String {
    "lombasku".into()
}

fn default_generation() -> String {
    "v3".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_critical_assets() -> Vec<String> {
    vec!["/".into(), "/offline.html".into(), "/manifest.json".into()]
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_backend_host_patterns() -> Vec<String> {
    vec!["supabase".into(), "googleapis".into()]
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp", "svg"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    "lombasku-offline/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_script_path() -> String {
    "/api/sw".into()
}

fn default_scope() -> String {
    "/".into()
}

fn default_update_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            generation: default_generation(),
            origin: default_origin(),
            critical_assets: default_critical_assets(),
            offline_page: default_offline_page(),
            api_prefix: default_api_prefix(),
            backend_host_patterns: default_backend_host_patterns(),
            image_extensions: default_image_extensions(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            script_path: default_script_path(),
            scope: default_scope(),
            update_interval_secs: default_update_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Partition names of the configured generation.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(&self.cache_prefix, &self.generation)
    }

    /// Resolve a path or URL against the configured origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let base = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        base.join(path)
            .map_err(|e| ConfigError::Invalid { field: "path".into(), reason: format!("{path}: {e}") })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LOMBASKU_`
    /// 2. TOML file from `LOMBASKU_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LOMBASKU_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LOMBASKU_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
