//! Service and store configuration
//!
//! Configuration is an explicit value handed to constructors. The command
//! line front end reads it from a TOML file:
//!
//! ```toml
//! [service]
//! base_interval_seconds = 10
//! default_interval_seconds = 60
//!
//! [store]
//! path = "/var/lib/alertprov/store.db"
//! busy_timeout_ms = 5000
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {reason}")]
    Invalid { reason: String },
}

/// Interval policy of the alert rule service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Evaluation granularity; every rule interval is a multiple of it
    pub base_interval_seconds: i64,
    /// Interval given to the first rule of a group when none is requested
    pub default_interval_seconds: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_interval_seconds: 10,
            default_interval_seconds: 60,
        }
    }
}

impl ServiceConfig {
    /// Check that the default interval is itself a valid rule interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_interval_seconds <= 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "base_interval_seconds must be positive, got {}",
                    self.base_interval_seconds
                ),
            });
        }
        if self.default_interval_seconds <= 0
            || self.default_interval_seconds % self.base_interval_seconds != 0
        {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "default_interval_seconds ({}) must be a positive multiple of base_interval_seconds ({})",
                    self.default_interval_seconds, self.base_interval_seconds
                ),
            });
        }
        Ok(())
    }
}

/// Location and locking behaviour of the SQLite store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// How long a writer waits for the database lock before failing
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".alertprov/store.db"),
            busy_timeout_ms: 5000,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.service.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.service.validate().is_ok());
        assert_eq!(config.service.base_interval_seconds, 10);
        assert_eq!(config.service.default_interval_seconds, 60);
        assert_eq!(config.store.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            "[service]\nbase_interval_seconds = 30\ndefault_interval_seconds = 90\n",
        )
        .unwrap();
        assert_eq!(config.service.base_interval_seconds, 30);
        assert_eq!(config.service.default_interval_seconds, 90);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_misaligned_default_rejected() {
        let err = AppConfig::from_toml_str(
            "[service]\nbase_interval_seconds = 10\ndefault_interval_seconds = 45\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{:?}", err);
    }

    #[test]
    fn test_zero_base_interval_rejected() {
        let config = ServiceConfig {
            base_interval_seconds: 0,
            default_interval_seconds: 60,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = AppConfig::from_toml_str("[service]\nbase_interval = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{:?}", err);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertprov.toml");
        std::fs::write(&path, "[store]\npath = \"rules.db\"\nbusy_timeout_ms = 250\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("rules.db"));
        assert_eq!(config.store.busy_timeout_ms, 250);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = AppConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
