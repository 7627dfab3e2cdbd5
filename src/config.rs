//! Boot-time configuration.
//!
//! Values come from built-in defaults, then an optional TOML file named by
//! `PETMAP_CONFIG`, then individual environment variables. Nothing here is
//! editable once the app is running.

use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://ripe-donella-atitus-fbbf314a.koyeb.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CONFIG_FILE: &str = "PETMAP_CONFIG";
pub const ENV_API_BASE_URL: &str = "PETMAP_API_BASE_URL";
pub const ENV_MAPS_API_KEY: &str = "PETMAP_MAPS_API_KEY";
pub const ENV_REQUEST_TIMEOUT: &str = "PETMAP_REQUEST_TIMEOUT_SECS";
pub const ENV_DATABASE_PATH: &str = "PETMAP_DATABASE_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Key for the map widget; only handed through to the view
    pub maps_api_key: Option<String>,
    pub request_timeout: Duration,
    pub database_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            maps_api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            database_path: PathBuf::from("./data/petmap.db"),
        }
    }
}

/// On-disk shape of the config file; every key is optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    maps_api_key: Option<String>,
    request_timeout_secs: Option<u64>,
    database_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the config file (if any) and the process environment
    pub fn load() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
            config.apply_file(Path::new(&path))?;
        }

        config.apply_vars(|key| std::env::var(key).ok())?;
        config.validate()?;

        log::info!(
            "Using service {} (timeout {}s)",
            config.api_base_url,
            config.request_timeout.as_secs()
        );
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), AppError> {
        let text = std::fs::read_to_string(path)?;
        self.apply_toml(&text)
    }

    /// Overlay the keys present in a TOML document
    pub fn apply_toml(&mut self, text: &str) -> Result<(), AppError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| AppError::Config(format!("Invalid config file: {}", e)))?;

        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(key) = file.maps_api_key {
            self.maps_api_key = Some(key);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = file.database_path {
            self.database_path = path;
        }
        Ok(())
    }

    /// Overlay values from a variable lookup (the environment in production)
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(key) = lookup(ENV_MAPS_API_KEY) {
            self.maps_api_key = Some(key);
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a number of seconds", ENV_REQUEST_TIMEOUT))
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Config("Request timeout must be positive".to_string()));
        }
        Ok(())
    }
}
