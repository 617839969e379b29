//! Client configuration
//!
//! Defaults point at the public provider endpoints. Values can be read from a
//! TOML file and overlaid from the environment:
//!
//! ```toml
//! bmrs_api_key = "..."
//! request_timeout_secs = 60
//! failure_policy = "skip"
//! power_plant_list_path = "smard_power_plant_list.csv"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{MarketDataError, Result};
use crate::http::FailurePolicy;

/// Environment variable holding the BMRS API key
pub const ENV_BMRS_API_KEY: &str = "BMRS_API_KEY";

/// Environment variable overriding the request timeout (seconds)
pub const ENV_TIMEOUT_SECS: &str = "MARKET_DATA_TIMEOUT_SECS";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Power plant list is refreshed when older than four weeks
pub const DEFAULT_POWER_PLANT_LIST_MAX_AGE_SECS: u64 = 4 * 7 * 24 * 60 * 60;

/// Settings shared by all provider clients
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// BMRS API key (only needed for GB operations)
    pub bmrs_api_key: String,

    /// Timeout of every HTTP request, no retry
    pub request_timeout_secs: u64,

    /// What a failed fetch unit does to the whole request
    pub failure_policy: FailurePolicy,

    /// SMARD base URL
    ///
    /// Example: `https://www.smard.de/app`
    pub smard_base_url: String,

    /// BMRS base URL
    ///
    /// Example: `https://api.bmreports.com/BMRS`
    pub bmrs_base_url: String,

    /// EirGrid Smart Grid Dashboard base URL
    ///
    /// Example: `https://www.smartgriddashboard.com/DashboardService.svc`
    pub eirgrid_base_url: String,

    /// Cached SMARD power plant list (CSV)
    pub power_plant_list_path: PathBuf,

    /// Age after which the power plant list is refreshed
    pub power_plant_list_max_age_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bmrs_api_key: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            failure_policy: FailurePolicy::default(),
            smard_base_url: "https://www.smard.de/app".to_string(),
            bmrs_base_url: "https://api.bmreports.com/BMRS".to_string(),
            eirgrid_base_url: "https://www.smartgriddashboard.com/DashboardService.svc".to_string(),
            power_plant_list_path: PathBuf::from("smard_power_plant_list.csv"),
            power_plant_list_max_age_secs: DEFAULT_POWER_PLANT_LIST_MAX_AGE_SECS,
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MarketDataError::Config(e.to_string()))
    }

    /// Read a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)?.with_env_overrides()
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `BMRS_API_KEY` and `MARKET_DATA_TIMEOUT_SECS` if set
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(
            std::env::var(ENV_BMRS_API_KEY).ok(),
            std::env::var(ENV_TIMEOUT_SECS).ok(),
        )
    }

    fn with_overrides(mut self, api_key: Option<String>, timeout: Option<String>) -> Result<Self> {
        if let Some(key) = api_key {
            self.bmrs_api_key = key;
        }
        if let Some(raw) = timeout {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                MarketDataError::Config(format!("{} must be whole seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn power_plant_list_max_age(&self) -> Duration {
        Duration::from_secs(self.power_plant_list_max_age_secs)
    }
}
