//! # Monitor Configuration
//!
//! Layered configuration built with the `config` crate:
//!
//! 1. built-in defaults,
//! 2. an optional TOML (or any `config`-supported format) file,
//! 3. `BATCH_MONITOR_*` environment variables (`__` separates nested keys, e.g.
//!    `BATCH_MONITOR_LOGGING__JSON=true`).
//!
//! The legacy `WORKSPACE_UID` variable is honoured when no layer set a workspace.
//!
//! ```rust,no_run
//! use batch_monitor::config::MonitorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::load()?;
//! println!("reading jobs from {} in {}", config.table_name, config.store_region);
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    ambient_keys, DEFAULT_REGION, DEFAULT_REMOTE_CALL_TIMEOUT_MS, DEFAULT_TABLE_NAME,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "BATCH_MONITOR";

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigurationError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; derived from the environment name when unset
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Record store table holding job records
    pub table_name: String,
    /// Region of the record store
    pub store_region: String,
    /// Workspace owning the task-automation clients; remediation is unavailable without it
    #[serde(default)]
    pub workspace_uid: Option<String>,
    /// Region used for remediation when the caller gives none
    pub default_region: String,
    /// Deadline per remote task-automation call, `0` disables it
    pub remote_call_timeout_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            store_region: DEFAULT_REGION.to_string(),
            workspace_uid: None,
            default_region: DEFAULT_REGION.to_string(),
            remote_call_timeout_ms: DEFAULT_REMOTE_CALL_TIMEOUT_MS,
            logging: LoggingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from defaults and the environment
    pub fn load() -> Result<Self, ConfigurationError> {
        Self::load_from(None)
    }

    /// Load from defaults, `path` (required when given) and the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("table_name", defaults.table_name)?
            .set_default("store_region", defaults.store_region)?
            .set_default("default_region", defaults.default_region)?
            .set_default(
                "remote_call_timeout_ms",
                defaults.remote_call_timeout_ms as i64,
            )?
            .set_default("logging.json", false)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: MonitorConfig = builder.build()?.try_deserialize()?;

        if config.workspace_uid.is_none() {
            config.workspace_uid = std::env::var(ambient_keys::WORKSPACE_UID).ok();
        }

        config.validate()
    }

    /// Check required values; an empty workspace uid is treated as unset
    pub fn validate(mut self) -> Result<Self, ConfigurationError> {
        if self.table_name.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "table_name",
                "table name cannot be empty",
            ));
        }

        if self.default_region.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "default_region",
                "default region cannot be empty",
            ));
        }

        if self.store_region.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "store_region",
                "store region cannot be empty",
            ));
        }

        if self
            .workspace_uid
            .as_deref()
            .is_some_and(|uid| uid.trim().is_empty())
        {
            self.workspace_uid = None;
        }

        Ok(self)
    }

    pub fn remote_call_timeout(&self) -> Option<Duration> {
        (self.remote_call_timeout_ms > 0).then(|| Duration::from_millis(self.remote_call_timeout_ms))
    }
}
