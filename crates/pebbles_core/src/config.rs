//! Runtime configuration for embedding hosts.
//!
//! # Invariants
//! - `from_env` never panics; malformed values become `ConfigError`.
//! - Unset variables fall back to `PebblesConfig::default()`.

use crate::logging::default_log_level;
use crate::repo::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PEBBLES_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PEBBLES_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PEBBLES_LOG_DIR";
pub const ENV_LIST_LIMIT: &str = "PEBBLES_LIST_LIMIT";

const DEFAULT_DB_FILE_NAME: &str = "pebbles.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Database path variable is set but blank.
    EmptyDbPath,
    /// List limit is not a positive integer.
    InvalidListLimit(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDbPath => write!(f, "{ENV_DB_PATH} must not be blank"),
            Self::InvalidListLimit(value) => {
                write!(f, "{ENV_LIST_LIMIT} must be a positive integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the CLI and embedding hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PebblesConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Cap applied to list endpoints.
    pub list_limit: usize,
}

impl Default for PebblesConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl PebblesConfig {
    /// Reads `PEBBLES_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            if path.trim().is_empty() {
                return Err(ConfigError::EmptyDbPath);
            }
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(raw) = lookup(ENV_LIST_LIMIT) {
            config.list_limit = match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::InvalidListLimit(raw)),
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PebblesConfig, ENV_DB_PATH, ENV_LIST_LIMIT, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = PebblesConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PebblesConfig::default());
        assert_eq!(config.list_limit, 1000);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = PebblesConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /var/lib/pebbles/data.sqlite3 "),
            (ENV_LOG_DIR, "/var/log/pebbles"),
            (ENV_LIST_LIMIT, "250"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/pebbles/data.sqlite3"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/pebbles")));
        assert_eq!(config.list_limit, 250);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            PebblesConfig::from_lookup(lookup(&[(ENV_LIST_LIMIT, "0")])).unwrap_err(),
            ConfigError::InvalidListLimit("0".to_string())
        );
        assert_eq!(
            PebblesConfig::from_lookup(lookup(&[(ENV_DB_PATH, "  ")])).unwrap_err(),
            ConfigError::EmptyDbPath
        );
    }
}
