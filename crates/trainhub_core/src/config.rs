//! Runtime configuration.
//!
//! Values come from defaults, a JSON document, or `TRAINHUB_*` environment
//! variables. Unset variables keep their defaults.

use crate::command::DEFAULT_HISTORY_LIMIT;
use crate::logging::{default_log_level, LoggingSettings};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TRAINHUB_DB_PATH";
pub const ENV_HISTORY_LIMIT: &str = "TRAINHUB_HISTORY_LIMIT";
pub const ENV_LOG_LEVEL: &str = "TRAINHUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TRAINHUB_LOG_DIR";

const DEFAULT_DB_FILE: &str = "trainhub.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainHubConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Undo entries kept per record kind.
    pub history_limit: usize,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for TrainHubConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid configuration document: {err}"),
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid value `{value}` for {key}: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl TrainHubConfig {
    /// Reads `TRAINHUB_DB_PATH`, `TRAINHUB_HISTORY_LIMIT`,
    /// `TRAINHUB_LOG_LEVEL` and `TRAINHUB_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(limit) = read(ENV_HISTORY_LIMIT) {
            config.history_limit =
                limit
                    .parse::<usize>()
                    .map_err(|err| ConfigError::InvalidValue {
                        key: ENV_HISTORY_LIMIT,
                        value: limit.clone(),
                        message: err.to_string(),
                    })?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        config.validated()
    }

    /// File logging settings, when a log directory is configured.
    pub fn logging_settings(&self) -> Option<LoggingSettings> {
        self.log_dir
            .as_ref()
            .map(|dir| LoggingSettings::new(self.log_level.clone(), dir.clone()))
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "history_limit",
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TrainHubConfig, ENV_DB_PATH, ENV_HISTORY_LIMIT, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = TrainHubConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TrainHubConfig::default());
        assert_eq!(config.history_limit, 100);
        assert!(config.logging_settings().is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = TrainHubConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/trainhub/catalog.db"),
            (ENV_HISTORY_LIMIT, " 25 "),
            (ENV_LOG_DIR, "/var/log/trainhub"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/trainhub/catalog.db"));
        assert_eq!(config.history_limit, 25);
        let settings = config.logging_settings().unwrap();
        assert_eq!(settings.log_dir, PathBuf::from("/var/log/trainhub"));
    }

    #[test]
    fn bad_history_limit_is_reported() {
        let err = TrainHubConfig::from_lookup(lookup(&[(ENV_HISTORY_LIMIT, "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == ENV_HISTORY_LIMIT
        ));

        let err = TrainHubConfig::from_lookup(lookup(&[(ENV_HISTORY_LIMIT, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn json_document_fills_missing_fields_with_defaults() {
        let config =
            TrainHubConfig::from_json_str(r#"{"db_path": "catalog.db", "history_limit": 10}"#)
                .unwrap();
        assert_eq!(config.db_path, PathBuf::from("catalog.db"));
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.log_dir, None);

        let err = TrainHubConfig::from_json_str(r#"{"db": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
