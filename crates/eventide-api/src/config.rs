//! Server configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for environment variable {name}: {value:?}")]
    InvalidValue {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub database_max_connections: u32,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Deadline applied to every request's repository calls.
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value
    /// or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let request_timeout_ms: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_MS", 5000)?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/eventide"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("REQUEST_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/eventide")
        );
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "")]).unwrap();

        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_malformed_port_is_rejected() {
        let result = config_from(&[("PORT", "http")]);

        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidValue {
                name: "PORT",
                value: "http".to_owned(),
            }
        );
    }
}
