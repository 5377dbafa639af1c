//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe where the records store lives and how core logging starts.
//! - Read overrides from `EXAMDB_*` environment variables.

use crate::logging::{default_log_level, init_logging};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "examdb.sqlite3";
const ENV_DB_PATH: &str = "EXAMDB_DB_PATH";
const ENV_LOG_LEVEL: &str = "EXAMDB_LOG_LEVEL";
const ENV_LOG_DIR: &str = "EXAMDB_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file; created with the full schema when missing.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling logs. `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Builds a config from process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level;
        }
        config.log_dir = non_blank(lookup(ENV_LOG_DIR)).map(PathBuf::from);
        config
    }

    /// Starts core logging when `log_dir` is set.
    ///
    /// Returns `Ok(true)` when logging is active after the call.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| format!("log_dir is not valid UTF-8: `{}`", dir.display()))?;
        init_logging(&self.log_level, dir)?;
        Ok(true)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
