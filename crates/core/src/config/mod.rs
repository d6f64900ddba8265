//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELTER_*)
//! 2. TOML config file (if SHELTER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::PartitionNames;
use crate::classify::Classifier;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELTER_*)
/// 2. TOML config file (if SHELTER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name used as the partition name prefix.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache version tag. Bumping it retires every existing partition at
    /// the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the application; same-origin requests are cached by class,
    /// other origins only when allowlisted.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite partition database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Overall HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout for API calls before the offline JSON payload is served.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Path fragment marking API calls.
    #[serde(default = "default_api_path_marker")]
    pub api_path_marker: String,

    /// Third-party domains whose resources are cached (`[a.com,b.com]` in env).
    #[serde(default = "default_third_party_domains")]
    pub third_party_domains: Vec<String>,

    /// Local assets pre-cached at install; all must succeed.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// External URLs pre-cached at install on a best-effort basis.
    #[serde(default)]
    pub third_party_assets: Vec<String>,

    /// Offline placeholder document; must be one of `static_assets`.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Entry bound for the dynamic pages partition.
    #[serde(default = "default_max_dynamic_entries")]
    pub max_dynamic_entries: usize,

    /// Entry bound for the images partition.
    #[serde(default = "default_max_image_entries")]
    pub max_image_entries: usize,

    /// Background sync tag that triggers the offline data hook.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
}

fn default_app_name() -> String {
    "app".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shelter-cache.sqlite")
}

fn default_user_agent() -> String {
    "shelter/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_api_timeout_ms() -> u64 {
    5_000
}

fn default_api_path_marker() -> String {
    "/api/".into()
}

fn default_third_party_domains() -> Vec<String> {
    ["cdn.jsdelivr.net", "cdnjs.cloudflare.com", "unpkg.com", "fonts.googleapis.com", "fonts.gstatic.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_static_assets() -> Vec<String> {
    ["/", "/offline.html", "/manifest.json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_max_dynamic_entries() -> usize {
    50
}

fn default_max_image_entries() -> usize {
    100
}

fn default_sync_tag() -> String {
    "sync-data".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            api_timeout_ms: default_api_timeout_ms(),
            api_path_marker: default_api_path_marker(),
            third_party_domains: default_third_party_domains(),
            static_assets: default_static_assets(),
            third_party_assets: Vec::new(),
            offline_page: default_offline_page(),
            max_dynamic_entries: default_max_dynamic_entries(),
            max_image_entries: default_max_image_entries(),
            sync_tag: default_sync_tag(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Parsed application origin.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Partition names for the configured app and version.
    pub fn partition_names(&self) -> PartitionNames {
        PartitionNames::new(&self.app_name, &self.cache_version)
    }

    pub fn classifier(&self) -> Result<Classifier, ConfigError> {
        Ok(Classifier::new(self.origin_url()?, &self.third_party_domains, &self.api_path_marker))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELTER_`
    /// 2. TOML file from `SHELTER_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SHELTER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELTER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
