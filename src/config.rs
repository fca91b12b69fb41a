//! Configuration Module
//! Dashboard settings, read from an optional JSON file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "uber_pickups.json";

pub const DATA_URL: &str =
    "https://s3-us-west-2.amazonaws.com/streamlit-demo-data/uber-raw-data-sep14.csv.gz";
pub const DATE_COLUMN: &str = "date/time";
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for data loading and the initial widget state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_url: String,
    pub row_limit: usize,
    /// Timestamp column, after lowercasing.
    pub date_column: String,
    /// chrono format string for the timestamp column.
    pub timestamp_format: String,
    pub default_hour: u8,
    pub show_raw_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_url: DATA_URL.to_string(),
            row_limit: 10_000,
            date_column: DATE_COLUMN.to_string(),
            timestamp_format: TIMESTAMP_FORMAT.to_string(),
            default_hour: 17,
            show_raw_data: false,
        }
    }
}

impl AppConfig {
    /// Load config from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&text)?;
        config.default_hour = config.default_hour.min(23);
        Ok(config)
    }
}
