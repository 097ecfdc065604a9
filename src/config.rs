//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line / environment overrides.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port must be non-zero")]
    ZeroPort,

    #[error("rates timeout must be at least one second")]
    ZeroTimeout,

    #[error("cannot load {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    /// Live exchange-rate endpoint; the base currency code is appended as a path segment.
    pub rates_endpoint: String,
    pub rates_timeout_secs: u64,
    /// Replaces the built-in tax tables when set.
    pub tax_tables_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            rates_endpoint: DEFAULT_RATES_ENDPOINT.to_string(),
            rates_timeout_secs: 5,
            tax_tables_path: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.rates_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Overrides collected from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<LogLevel>,
    pub rates_endpoint: Option<String>,
}

pub fn load_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let file_error = |reason: String| ConfigError::File {
        path: path.display().to_string(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    toml::from_str(&contents).map_err(|e| file_error(e.to_string()))
}

pub fn build_config(overrides: &ConfigOverrides) -> Result<ServerConfig, ConfigError> {
    let mut config = match &overrides.config_file {
        Some(path) => load_config_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = &overrides.host {
        config.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(level) = overrides.log_level {
        config.log_level = level;
    }
    if let Some(endpoint) = &overrides.rates_endpoint {
        config.rates_endpoint = endpoint.clone();
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = build_config(&ConfigOverrides::default()).expect("defaults validate");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.rates_endpoint, DEFAULT_RATES_ENDPOINT);
        assert!(config.tax_tables_path.is_none());
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = ConfigOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            log_level: Some(LogLevel::from_str("DEBUG", true).expect("known level")),
            ..ConfigOverrides::default()
        };
        let config = build_config(&overrides).expect("valid overrides");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn rejects_port_zero_and_unknown_log_level() {
        let zero_port = ConfigOverrides {
            port: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(matches!(build_config(&zero_port), Err(ConfigError::ZeroPort)));

        assert!(toml::from_str::<ServerConfig>(r#"log_level = "loud""#).is_err());
        assert!(LogLevel::from_str("loud", true).is_err());
    }

    #[test]
    fn log_level_maps_to_level_filter() {
        assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::INFO);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn toml_file_fields_are_partial() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 3000
            log_level = "warn"
            rates_timeout_secs = 2
            "#,
        )
        .expect("parses");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.rates_timeout_secs, 2);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn missing_config_file_is_reported() {
        let overrides = ConfigOverrides {
            config_file: Some(PathBuf::from("/nonexistent/fincalc.toml")),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            build_config(&overrides),
            Err(ConfigError::File { .. })
        ));
    }
}
