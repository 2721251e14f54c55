//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: String,
    pub log_level: Level,
    /// Serve synthesized data instead of calling the learning service.
    pub offline: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("ZHIDAO_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://zhidao.db?mode=rwc".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = parse_log_level(&log_level_str)?;

        let offline = match std::env::var("ZHIDAO_OFFLINE") {
            Ok(value) => parse_flag("ZHIDAO_OFFLINE", &value)?,
            Err(_) => false,
        };

        Ok(Self {
            api_base_url,
            database_url,
            log_level,
            offline,
        })
    }
}

fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    value.parse::<Level>().map_err(|_| {
        ConfigError::InvalidValue(
            "RUST_LOG".to_string(),
            format!("'{}' is not a valid log level", value),
        )
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("ZHIDAO_OFFLINE", "TRUE").unwrap());
        assert!(parse_flag("ZHIDAO_OFFLINE", " 1 ").unwrap());
        assert!(!parse_flag("ZHIDAO_OFFLINE", "off").unwrap());
        assert!(!parse_flag("ZHIDAO_OFFLINE", "").unwrap());
    }

    #[test]
    fn bad_flag_names_the_variable() {
        let err = parse_flag("ZHIDAO_OFFLINE", "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for the environment variable ZHIDAO_OFFLINE: 'maybe' is not a boolean"
        );
    }

    #[test]
    fn log_levels_parse_case_insensitively() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
