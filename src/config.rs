use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rates_source: RatesSourceMode,
    pub rates_api_url: Option<String>,
    pub rates_api_token: Option<String>,
    /// Fixed "today" for settlement calculations; the current UTC date when unset.
    pub settlement_as_of: Option<NaiveDate>,
}

/// Where quotes read their pricing tables from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatesSourceMode {
    /// The local SQLite pricing store.
    Local,
    /// Another instance's admin API.
    Remote,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let rates_source = match env_map
            .get("RATES_SOURCE")
            .map(|s| s.as_str())
            .unwrap_or("local")
        {
            "local" => RatesSourceMode::Local,
            "remote" => RatesSourceMode::Remote,
            other => {
                return Err(ConfigError::InvalidValue(
                    "RATES_SOURCE".to_string(),
                    format!("must be local or remote, got {}", other),
                ))
            }
        };

        let rates_api_url = non_empty(&env_map, "RATES_API_URL");
        if rates_source == RatesSourceMode::Remote && rates_api_url.is_none() {
            return Err(ConfigError::MissingEnv("RATES_API_URL".to_string()));
        }

        let rates_api_token = non_empty(&env_map, "RATES_API_TOKEN");

        let settlement_as_of = non_empty(&env_map, "SETTLEMENT_AS_OF")
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                    ConfigError::InvalidValue(
                        "SETTLEMENT_AS_OF".to_string(),
                        "must be a YYYY-MM-DD date".to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Config {
            port,
            database_path,
            rates_source,
            rates_api_url,
            rates_api_token,
            settlement_as_of,
        })
    }

    /// Date settlements are computed against.
    pub fn as_of_date(&self) -> NaiveDate {
        self.settlement_as_of
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
