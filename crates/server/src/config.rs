//! Server configuration from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const ADDR_VAR: &str = "NONGJEONG_ADDR";
pub const REQUEST_TIMEOUT_VAR: &str = "NONGJEONG_REQUEST_TIMEOUT_SECS";
pub const SCRAPE_BUDGET_VAR: &str = "NONGJEONG_SCRAPE_BUDGET_SECS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be a whole number of seconds: {value}")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Hard limit on any request, enforced by the timeout layer.
    pub request_timeout: Duration,
    /// Per-site budget for all-outlet scrapes; kept below the request timeout
    /// so partial results can still be returned.
    pub scrape_budget: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            request_timeout: Duration::from_secs(60),
            scrape_budget: Duration::from_secs(55),
        }
    }
}

fn seconds(var: &'static str, value: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidSeconds { var, value: raw }),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let addr = match lookup(ADDR_VAR) {
            None => defaults.addr,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddr { var: ADDR_VAR, value: raw })?,
        };

        Ok(Self {
            addr,
            request_timeout: seconds(REQUEST_TIMEOUT_VAR, lookup(REQUEST_TIMEOUT_VAR), defaults.request_timeout)?,
            scrape_budget: seconds(SCRAPE_BUDGET_VAR, lookup(SCRAPE_BUDGET_VAR), defaults.scrape_budget)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3000);
        assert!(config.scrape_budget < config.request_timeout);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ADDR_VAR, "127.0.0.1:8080"),
            (REQUEST_TIMEOUT_VAR, "30"),
            (SCRAPE_BUDGET_VAR, " 25 "),
        ]))
        .unwrap();

        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.scrape_budget, Duration::from_secs(25));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[(ADDR_VAR, "localhost")])).unwrap_err(),
            ConfigError::InvalidAddr { var: ADDR_VAR, value: "localhost".to_string() }
        );
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[(SCRAPE_BUDGET_VAR, "soon")])),
            Err(ConfigError::InvalidSeconds { .. })
        ));
    }
}
