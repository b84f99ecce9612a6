//! Process configuration read from the environment.
//!
//! Command-line flags override these values in the binary; library callers
//! may also build `AppConfig` directly.

use crate::logging::{default_log_level, normalize_level, LogTarget};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "CONFLICTDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CONFLICTDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CONFLICTDESK_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "conflictdesk.sqlite3";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: value must not be blank")]
    Blank { key: &'static str },
    #[error("{key}: unsupported log level `{value}`")]
    InvalidLogLevel { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(non_blank(ENV_DB_PATH, &path)?);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)
                .map_err(|_| ConfigError::InvalidLogLevel {
                    key: ENV_LOG_LEVEL,
                    value: level.trim().to_string(),
                })?
                .to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(non_blank(ENV_LOG_DIR, &dir)?));
        }
        Ok(config)
    }

    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Directory(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}

fn non_blank<'a>(key: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Blank { key });
    }
    Ok(trimmed)
}
