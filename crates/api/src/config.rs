use std::time::Duration;

use assetflow_remote::RemoteConfig;

/// A required variable is missing or a variable does not parse.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5173`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Request timeout in seconds (default: `30`). Applies both to
    /// incoming requests and to each upstream call.
    pub request_timeout_secs: u64,
    /// Base URL of the remote pipeline.
    pub base_url: String,
    /// Value sent verbatim in the upstream `Authorization` header.
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5173`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `BASE_URL`             | required                   |
    /// | `API_KEY`              | unset                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", "5173", "u16")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = positive(
            "REQUEST_TIMEOUT_SECS",
            parse_var("REQUEST_TIMEOUT_SECS", "30", "u64")?,
        )?;

        let base_url = std::env::var("BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("BASE_URL"))?;

        let api_key = std::env::var("API_KEY").ok().filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            base_url,
            api_key,
        })
    }

    /// Client settings for the upstream pipeline.
    pub fn remote(&self) -> RemoteConfig {
        let config = RemoteConfig::new(&self.base_url)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));
        match &self.api_key {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(name).unwrap_or_else(|_| default.into());
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value,
    })
}

fn positive(name: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            expected: "positive integer",
            value: value.to_string(),
        });
    }
    Ok(value)
}
