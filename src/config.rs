//! Configuration loading and management
//!
//! Handles parsing of `trellis.toml` configuration files. Sheet credentials
//! can be supplied or overridden through `TRELLIS_*` environment variables
//! so keys stay out of checked-in config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sheets::RetryPolicy;

/// Default name of the configuration file, looked up in the working
/// directory.
pub const CONFIG_FILE: &str = "trellis.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote sheet coordinates
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Reconciliation polling and read-retry settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Remote sheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Base URL of the values API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Spreadsheet identifier
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Cell range holding the task table
    #[serde(default = "default_range")]
    pub range: String,

    /// API key appended to every request
    #[serde(default)]
    pub api_key: String,
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_range() -> String {
    "Tasks!A1:Z1000".to_string()
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            spreadsheet_id: String::new(),
            range: default_range(),
            api_key: String::new(),
        }
    }
}

/// Polling and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between reconciliation polls
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Attempt cap for rate-limited reads
    #[serde(default = "default_read_attempts")]
    pub read_attempts: u32,

    /// Base backoff delay, doubled per retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_interval() -> u64 {
    30
}

fn default_read_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            read_attempts: default_read_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Task defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Category assigned to quick-added tasks that name none
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_category() -> String {
    "General".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist and parse; the
    /// default path falls back to built-in defaults when absent. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => {
                let default = Path::new(CONFIG_FILE);
                if default.exists() {
                    let raw = std::fs::read_to_string(default)?;
                    toml::from_str(&raw)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(id) = non_empty_env("TRELLIS_SPREADSHEET_ID") {
            self.sheet.spreadsheet_id = id;
        }
        if let Some(key) = non_empty_env("TRELLIS_API_KEY") {
            self.sheet.api_key = key;
        }
        if let Some(range) = non_empty_env("TRELLIS_RANGE") {
            self.sheet.range = range;
        }
    }

    /// Remote commands need a sheet to talk to.
    pub fn require_sheet(&self) -> Result<&SheetConfig> {
        if self.sheet.spreadsheet_id.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "sheet.spreadsheet_id is not set (trellis.toml or TRELLIS_SPREADSHEET_ID)"
                    .to_string(),
            ));
        }
        Ok(&self.sheet)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            read_attempts: self.poll.read_attempts.max(1),
            backoff_base_ms: self.poll.backoff_base_ms,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sheet.range, "Tasks!A1:Z1000");
        assert_eq!(config.poll.interval_secs, 30);
        assert_eq!(config.poll.read_attempts, 3);
        assert_eq!(config.tasks.default_category, "General");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let raw = r#"
[sheet]
spreadsheet_id = "abc123"

[poll]
interval_secs = 5
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.sheet.spreadsheet_id, "abc123");
        assert_eq!(config.sheet.base_url, "https://sheets.googleapis.com/v4");
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll.backoff_base_ms, 500);
    }

    #[test]
    fn missing_sheet_id_is_a_config_error() {
        let config = Config::default();
        assert!(config.require_sheet().is_err());
    }
}
