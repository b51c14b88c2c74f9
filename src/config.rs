//! Environment-driven configuration
//!
//! Required:
//!   PORT              HTTP listen port
//!   DATABASE_URL      Postgres connection string
//!   CACHE_IMAGE_PATH  where the summary image is written and served from
//!
//! Optional:
//!   COUNTRIES_API_URL            countries catalog endpoint
//!   RATES_API_URL                USD exchange-rate endpoint
//!   EXTERNAL_FETCH_TIMEOUT_SECS  per-request deadline (default: 15)
//!   DATABASE_POOL_SIZE           max pooled connections (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_COUNTRIES_API_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_API_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Upstream endpoints and their deadline
#[derive(Debug, Clone)]
pub struct ExternalApiConfig {
    pub countries_url: String,
    pub rates_url: String,
    pub timeout: Duration,
}

impl Default for ExternalApiConfig {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_API_URL.to_string(),
            rates_url: DEFAULT_RATES_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub database_pool_size: u32,
    pub cache_image_path: PathBuf,
    pub external: ExternalApiConfig,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port_raw = required("PORT")?;
        let port = port_raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
            var: "PORT",
            value: port_raw.clone(),
            reason: e.to_string(),
        })?;

        let database_url = required("DATABASE_URL")?;
        let cache_image_path = PathBuf::from(required("CACHE_IMAGE_PATH")?);

        let database_pool_size = match lookup("DATABASE_POOL_SIZE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: "DATABASE_POOL_SIZE",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_POOL_SIZE,
        };

        let timeout_secs = match lookup("EXTERNAL_FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "EXTERNAL_FETCH_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "EXTERNAL_FETCH_TIMEOUT_SECS",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let external = ExternalApiConfig {
            countries_url: lookup("COUNTRIES_API_URL")
                .unwrap_or_else(|| DEFAULT_COUNTRIES_API_URL.to_string()),
            rates_url: lookup("RATES_API_URL").unwrap_or_else(|| DEFAULT_RATES_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            port,
            database_url,
            database_pool_size,
            cache_image_path,
            external,
        })
    }
}
