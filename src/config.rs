//! Dashboard configuration, read from a JSON file next to the binary.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

/// Sheet used until a config file points somewhere else.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRk_qYVfO8eO_O7oX4j8GkMv_aQn_wXW_rZk-2jX_x_yZ_w/pub?output=csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Which sheet layout to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Weekly when the key column exists, ledger otherwise.
    #[default]
    Auto,
    /// One row per week, one column per year.
    Weekly,
    /// One row per sale (`Dato`, `Omsetning`, `Antall`).
    Ledger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub sheet_url: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub key_column: String,
    pub currency_suffix: String,
    pub layout: LayoutMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Ukentlig Salgsdashboard".to_string(),
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            cache_ttl_secs: 600,
            request_timeout_secs: 30,
            key_column: "Uke".to_string(),
            currency_suffix: "kr".to_string(),
            layout: LayoutMode::Auto,
        }
    }
}

impl DashboardConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet_url.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet_url is empty".into()));
        }
        if self.key_column.trim().is_empty() {
            return Err(ConfigError::Invalid("key_column is empty".into()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache_ttl_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Load and validate a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it is absent or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), url = %config.sheet_url, "config loaded");
                config
            }
            Err(e) => {
                error!(path = %path.display(), "{e}; using defaults");
                Self::default()
            }
        }
    }
}
