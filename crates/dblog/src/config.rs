//! Logger configuration file
//!
//! ```toml
//! format = "[%loglevel][%hh:%mm:%ss]%{cyan}[%class] > %{white}%text"
//! minimum_level = "information"
//! file = "logs/app.log"
//!
//! [colors]
//! success = "dark_green"
//!
//! [database]
//! query = "insert into mylog values ('%loglevel','%class','%method','%text')"
//! name = "logs"
//!
//! [database.server]
//! host = "127.0.0.1"
//! port = 3306
//! username = "logger"
//! password = "secret"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use dblog_core::{ConnectionConfig, DatabaseConfig, DblogError, Result, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::level::{ConsoleColor, LevelColors, LogLevel};
use crate::sink::ColorMode;

pub const DEFAULT_FORMAT: &str = "[%loglevel][%hh:%mm:%ss] %text";

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_driver() -> String {
    "mysql".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub minimum_level: LogLevel,

    #[serde(default)]
    pub color: ColorMode,

    /// Append log lines to this file
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Per-level console color overrides
    #[serde(default)]
    pub colors: BTreeMap<LogLevel, ConsoleColor>,

    #[serde(default)]
    pub database: Option<DatabaseSinkConfig>,
}

/// Where and how log lines are inserted into a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSinkConfig {
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Statement template, rendered with the same placeholders as lines
    pub query: String,

    pub server: ServerConfig,

    #[serde(flatten)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl DatabaseSinkConfig {
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config =
            ConnectionConfig::new(&self.driver, self.server.clone(), self.database.clone());
        config.params = self.params.clone();
        config
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            minimum_level: LogLevel::default(),
            color: ColorMode::default(),
            file: None,
            colors: BTreeMap::new(),
            database: None,
        }
    }
}

impl LoggerConfig {
    /// Read a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DblogError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| DblogError::Configuration(format!("invalid logger configuration: {}", e)))?;
        if let Some(database) = &config.database {
            database.database.validate()?;
        }
        Ok(config)
    }

    /// Default colors with the configured overrides applied
    pub fn level_colors(&self) -> LevelColors {
        let mut colors = LevelColors::default();
        for (level, color) in &self.colors {
            colors.set(*level, *color);
        }
        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LoggerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert_eq!(config.minimum_level, LogLevel::Trace);
        assert_eq!(config.level_colors(), LevelColors::default());
    }

    #[test]
    fn test_full_config() {
        let config = LoggerConfig::from_toml_str(
            r#"
            format = "%loglevel %text"
            minimum_level = "warn"
            color = "never"
            file = "logs/app.log"

            [colors]
            success = "dark_green"
            Error = "magenta"

            [database]
            query = "insert into mylog values ('%loglevel','%text')"
            name = "logs"
            pool_max_size = 20

            [database.server]
            host = "db.internal"
            port = 3307
            username = "logger"

            [database.params]
            socket = "/run/mysqld/mysqld.sock"
            "#,
        )
        .unwrap();

        assert_eq!(config.minimum_level, LogLevel::Warning);
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.file, Some(PathBuf::from("logs/app.log")));

        let colors = config.level_colors();
        assert_eq!(colors.get(LogLevel::Success), ConsoleColor::DarkGreen);
        assert_eq!(colors.get(LogLevel::Error), ConsoleColor::Magenta);
        assert_eq!(colors.get(LogLevel::Warning), ConsoleColor::Yellow);

        let database = config.database.unwrap();
        assert_eq!(database.driver, "mysql");
        assert_eq!(database.database.pool_min_size, 5);
        assert_eq!(database.database.pool_max_size, 20);

        let connection = database.connection_config();
        assert_eq!(connection.server.host, "db.internal");
        assert_eq!(connection.server.password, "");
        assert_eq!(connection.database.name, "logs");
        assert_eq!(connection.param("socket"), Some("/run/mysqld/mysqld.sock"));
    }

    #[test]
    fn test_invalid_config() {
        let err = LoggerConfig::from_toml_str(r#"minimum_level = "loud""#).unwrap_err();
        assert!(matches!(err, DblogError::Configuration(_)));

        let err = LoggerConfig::from_toml_str(
            r#"
            [database]
            query = "insert"
            name = "logs"
            pool_min_size = 10
            pool_max_size = 2
            [database.server]
            host = "h"
            port = 1
            username = "u"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, DblogError::Configuration(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoggerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DblogError::Configuration(_)));
    }
}
