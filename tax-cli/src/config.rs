//! Layered application settings.
//!
//! Built-in defaults, then an optional TOML file, then `DATABASE_URL`, then
//! command line flags. Each layer only overrides what it sets.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "deductions.db"
//!
//! [logging]
//! level = "info"
//! file = "tax-cli.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tax_core::db::DbConfig;
use thiserror::Error;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "deductions.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Appended to when set, in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Defaults, overlaid with `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Applies the value of `DATABASE_URL`, if any. Empty values are ignored.
    pub fn apply_env(
        &mut self,
        database_url: Option<String>,
    ) {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.database.connection_string = url;
        }
    }

    pub fn apply_overrides(
        &mut self,
        overrides: ConfigOverrides,
    ) {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(db) = overrides.db {
            self.database.connection_string = db;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.backend, &self.database.connection_string)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_use_sqlite_file() {
        let config = AppConfig::default();

        assert_eq!(config.db_config(), DbConfig::new("sqlite", "deductions.db"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn full_file_is_read() {
        let config = AppConfig::from_toml_str(
            r#"
            [database]
            backend = "sqlite"
            connection_string = ":memory:"

            [logging]
            level = "info"
            file = "tax.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_config(), DbConfig::default());
        assert_eq!(config.logging.file, Some(PathBuf::from("tax.log")));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let result = AppConfig::from_toml_str("[database\nbackend = 1");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent-dir/tax-cli.toml")));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn env_overrides_file_and_flags_override_env() {
        let mut config = AppConfig::default();

        config.apply_env(Some("sqlite://from-env.db".to_string()));
        assert_eq!(config.database.connection_string, "sqlite://from-env.db");

        config.apply_overrides(ConfigOverrides {
            db: Some(":memory:".to_string()),
            log_level: Some("trace".to_string()),
            ..Default::default()
        });

        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let mut config = AppConfig::default();

        config.apply_env(Some("  ".to_string()));

        assert_eq!(config, AppConfig::default());
    }
}
