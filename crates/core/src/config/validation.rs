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
    /// - `app_name`, `cache_version` or `user_agent` is empty
    /// - `origin` is not an http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` or `api_timeout_ms` is outside 100ms..=5 minutes
    /// - an entry bound is 0
    /// - `offline_page` is not listed in `static_assets`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(invalid("app_name", "must not be empty"));
        }
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "must be an http or https URL"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        for (field, value) in [("timeout_ms", self.timeout_ms), ("api_timeout_ms", self.api_timeout_ms)] {
            if value < 100 {
                return Err(invalid(field, "must be at least 100ms"));
            }
            if value > 300_000 {
                return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.max_dynamic_entries == 0 {
            return Err(invalid("max_dynamic_entries", "must be greater than 0"));
        }
        if self.max_image_entries == 0 {
            return Err(invalid("max_image_entries", "must be greater than 0"));
        }

        if !self.static_assets.iter().any(|asset| asset == &self.offline_page) {
            return Err(invalid("offline_page", "must be listed in static_assets"));
        }

        if self.api_path_marker.is_empty() {
            tracing::warn!("api_path_marker is empty; no request will be treated as an API call");
        }

        Ok(())
    }
}
