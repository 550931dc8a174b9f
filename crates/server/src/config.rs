//! Runtime configuration read from the environment (and `.env`, loaded in `main`).

use std::net::SocketAddr;

use thiserror::Error;

use crate::PageLimits;

const DEFAULT_DATABASE_URL: &str = "sqlite://ledger.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_PAGE_LIMIT: i64 = 100;
const DEFAULT_MAX_PAGE_LIMIT: i64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub anthropic_api_key: Option<String>,
    pub assistant_model: Option<String>,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let default_page_limit = parse_or(get("DEFAULT_PAGE_LIMIT"), "DEFAULT_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)?;
        let max_page_limit = parse_or(get("MAX_PAGE_LIMIT"), "MAX_PAGE_LIMIT", DEFAULT_MAX_PAGE_LIMIT)?;

        if default_page_limit <= 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_PAGE_LIMIT",
                value: default_page_limit.to_string(),
            });
        }
        if max_page_limit < default_page_limit {
            return Err(ConfigError::Invalid {
                var: "MAX_PAGE_LIMIT",
                value: max_page_limit.to_string(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            assistant_model: get("ASSISTANT_MODEL"),
            default_page_limit,
            max_page_limit,
        })
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: "HOST",
                value: self.host.clone(),
            })
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address().unwrap().to_string(), "127.0.0.1:3001");
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.page_limits().default_limit, 100);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = config(&[("ANTHROPIC_API_KEY", "  "), ("PORT", "8080")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("DEFAULT_PAGE_LIMIT", "50"), ("MAX_PAGE_LIMIT", "10")]),
            Err(ConfigError::Invalid { var: "MAX_PAGE_LIMIT", .. })
        ));
    }
}
