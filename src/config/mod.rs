//
//  enterprise-cli
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Tunable settings for the HTTP client and the pagination engine, plus the
//! locations of the files the CLI reads.
//!
//! ## Sources
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform configuration directory (or `$ENT_CONFIG`)
//! 3. `ENT_*` environment variables
//!
//! ## Configuration File Location
//!
//! - **Linux**: `~/.config/ent/config.toml`
//! - **macOS**: `~/Library/Application Support/ent/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\ent\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! max_attempts = 3
//! base_delay_ms = 500
//! multiplier = 2.0
//! max_delay_ms = 30000
//!
//! [pagination]
//! page_size = 50
//! max_results_cap = 1000
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `ENT_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `ENT_MAX_ATTEMPTS` | `http.max_attempts` |
//! | `ENT_BASE_DELAY_MS` | `http.base_delay_ms` |
//! | `ENT_MAX_DELAY_MS` | `http.max_delay_ms` |
//! | `ENT_PAGE_SIZE` | `pagination.page_size` |
//!
//! ## Submodules
//!
//! - [`file`]: Low-level file reading and the credential-file parser

mod file;

pub use file::*;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::api::common::ApiError;
use crate::api::retry::RetryPolicy;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "ENT_CONFIG";

/// Environment variable overriding the credential file location.
pub const CREDENTIALS_ENV: &str = "ENT_CREDENTIALS_FILE";

/// Global settings container.
///
/// # Example
///
/// ```rust
/// use enterprise_cli::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.http.timeout_secs, 30);
/// assert_eq!(config.pagination.page_size, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpSettings,

    /// Pagination settings.
    #[serde(default)]
    pub pagination: PaginationSettings,
}

/// Timeout and retry settings for the HTTP client.
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `timeout_secs` | `30` |
/// | `max_attempts` | `3` |
/// | `base_delay_ms` | `500` |
/// | `multiplier` | `2.0` |
/// | `max_delay_ms` | `30000` |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Timeout for a single attempt, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts for transient failures, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Exponential growth factor of the backoff.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Cap on any single backoff (and on retry-after hints), in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Page size and overall result cap for listing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationSettings {
    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on the records any single listing may return.
    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: usize,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_results_cap() -> usize {
    1000
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_results_cap: default_max_results_cap(),
        }
    }
}

impl Config {
    /// Loads settings from the default location and applies environment overrides.
    ///
    /// A missing settings file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid TOML, or if an
    /// `ENT_*` override does not parse.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if config_exists(&path) => Self::parse(&read_config_file(&path)?)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parses TOML settings content.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ApiError::validation(format!("invalid settings file: {}", e)).into())
    }

    /// Applies `ENT_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env_value(&lookup, "ENT_TIMEOUT_SECS")? {
            self.http.timeout_secs = v;
        }
        if let Some(v) = env_value(&lookup, "ENT_MAX_ATTEMPTS")? {
            self.http.max_attempts = v;
        }
        if let Some(v) = env_value(&lookup, "ENT_BASE_DELAY_MS")? {
            self.http.base_delay_ms = v;
        }
        if let Some(v) = env_value(&lookup, "ENT_MAX_DELAY_MS")? {
            self.http.max_delay_ms = v;
        }
        if let Some(v) = env_value(&lookup, "ENT_PAGE_SIZE")? {
            self.pagination.page_size = v;
        }
        Ok(())
    }

    /// Returns the platform configuration directory for `ent`.
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the settings file path (`$ENT_CONFIG` or `<config dir>/config.toml`).
    pub fn config_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::config_dir().map(|dir| dir.join("config.toml")),
        }
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }

    /// Retry policy derived from the HTTP settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(&self.http)
    }
}

fn env_value<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{} must be a number, got '{}'", key, raw))),
        _ => Ok(None),
    }
}

/// Returns the credential file path.
///
/// `$ENT_CREDENTIALS_FILE` when set, otherwise
/// `~/.enterprise-tools/credentials.env`.
pub fn credentials_path() -> Option<PathBuf> {
    match std::env::var_os(CREDENTIALS_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => BaseDirs::new().map(|dirs| {
            dirs.home_dir()
                .join(".enterprise-tools")
                .join("credentials.env")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = Config::parse("[http]\nmax_attempts = 5\n").unwrap();
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.pagination.page_size, 50);
    }

    #[test]
    fn test_parse_invalid_toml_is_validation_error() {
        let err = Config::parse("[http\n").unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.exit_code(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("ENT_MAX_ATTEMPTS", "1"), ("ENT_BASE_DELAY_MS", "0")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.http.max_attempts, 1);
        assert_eq!(config.http.base_delay_ms, 0);
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "ENT_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
