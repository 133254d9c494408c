//! Service configuration.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults,
//! 2. an optional TOML file (path from `ADDRGROUP_CONFIG`),
//! 3. environment variables (after `dotenv` has loaded any `.env` file).
//!
//! Environment lookups are injected as a closure so tests can supply their
//! own variables without touching the process environment.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::ingest::record::{CityTrim, ParseOptions};
use crate::logging::LogLevel;

/// Port used when neither the config file nor `LISTEN_PORT` sets one.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

pub const ENV_CONFIG_PATH: &str = "ADDRGROUP_CONFIG";
pub const ENV_LISTEN_PORT: &str = "LISTEN_PORT";
pub const ENV_LOG_LEVEL: &str = "ADDRGROUP_LOG_LEVEL";
pub const ENV_CITY_TRIM: &str = "ADDRGROUP_CITY_TRIM";

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_port: DEFAULT_LISTEN_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub city_trim: CityTrim,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io { path: String, source: std::io::Error },
    /// The config file is not valid TOML for `ServiceConfig`.
    Parse { path: String, message: String },
    /// An environment variable held an unusable value.
    InvalidEnv { var: String, value: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config file {}: {}", path, source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config file {}: {}", path, message)
            }
            ConfigError::InvalidEnv { var, value, message } => {
                write!(f, "invalid value '{}' for {}: {}", value, var, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    /// Parses a config from TOML text. `origin` is only used in errors.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads the config file at `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(ServiceConfig::default());
        };
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&text, &display)
    }

    /// Loads the full layered configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let path = lookup(ENV_CONFIG_PATH);
        let mut config = Self::load(path.as_deref().map(Path::new))?;
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// Applies `LISTEN_PORT`, `ADDRGROUP_LOG_LEVEL` and `ADDRGROUP_CITY_TRIM`.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_LISTEN_PORT) {
            self.server.listen_port = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid_env(ENV_LISTEN_PORT, &value, e.to_string()))?;
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            self.logging.level = value
                .parse()
                .map_err(|e: String| invalid_env(ENV_LOG_LEVEL, &value, e))?;
        }
        if let Some(value) = get(ENV_CITY_TRIM) {
            self.parser.city_trim = value
                .parse()
                .map_err(|e: String| invalid_env(ENV_CITY_TRIM, &value, e))?;
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            city_trim: self.parser.city_trim,
        }
    }
}

fn invalid_env(var: &str, value: &str, message: String) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.server.listen_port, 8080);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.file, None);
        assert_eq!(config.parser.city_trim, CityTrim::Exact);
    }

    #[test]
    fn test_full_toml_file() {
        let text = r#"
            [server]
            listen_port = 9000

            [logging]
            level = "warning"
            file = "/tmp/addrgroup.log"
            console_timestamps = true

            [parser]
            city_trim = "character-set"
        "#;
        let config = ServiceConfig::from_toml_str(text, "inline").unwrap();
        assert_eq!(config.server.listen_port, 9000);
        assert_eq!(config.logging.level, LogLevel::Warning);
        assert_eq!(config.logging.file.as_deref(), Some("/tmp/addrgroup.log"));
        assert!(config.logging.console_timestamps);
        assert_eq!(config.parse_options().city_trim, CityTrim::CharacterSet);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml_str("[logging]\nlevel = \"debug\"\n", "inline").unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.server.listen_port, DEFAULT_LISTEN_PORT);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = ServiceConfig::from_toml_str("[parser]\ncity_trim = \"fuzzy\"\n", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ServiceConfig::load(Some(Path::new("/nonexistent/addrgroup.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_env_overrides(env(&[
                ("LISTEN_PORT", "8000"),
                ("ADDRGROUP_LOG_LEVEL", "error"),
                ("ADDRGROUP_CITY_TRIM", "character-set"),
            ]))
            .unwrap();
        assert_eq!(config.server.listen_port, 8000);
        assert_eq!(config.logging.level, LogLevel::Error);
        assert_eq!(config.parser.city_trim, CityTrim::CharacterSet);
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut config = ServiceConfig::default();
        config.apply_env_overrides(env(&[("LISTEN_PORT", "")])).unwrap();
        assert_eq!(config.server.listen_port, DEFAULT_LISTEN_PORT);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env_overrides(env(&[("LISTEN_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "LISTEN_PORT"));
    }
}
