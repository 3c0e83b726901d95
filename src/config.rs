//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

fn default_storage_key() -> String {
    "alarm".into()
}

fn default_console_group() -> u64 {
    0
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the persisted alarm snapshot and stored attachments.
    pub data_dir: PathBuf,
    /// Blob-store key under which the alarm snapshot lives.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// The bot's own user id; mentions targeting it are stripped from payloads.
    pub self_id: u64,
    /// Group id bound to the stdio console transport.
    #[serde(default = "default_console_group")]
    pub console_group: u64,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory where stored image attachments live.
    #[must_use]
    pub fn attachment_dir(&self) -> PathBuf {
        self.data_dir.join("attachments")
    }

    fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("data_dir must not be empty".into()));
        }
        if self.storage_key.is_empty() {
            return Err(AppError::Config("storage_key must not be empty".into()));
        }
        Ok(())
    }
}
