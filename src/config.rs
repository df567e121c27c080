// Runtime configuration for the cache and the upstream trip provider

use std::{env, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 360,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub path: String,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_key: "123456".to_string(),
            path: "/api".to_string(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Loads configuration from the environment, reading a `.env` file first
    /// when one is present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let provider = ProviderConfig {
            base_url: env::var("API_URL").unwrap_or(defaults.provider.base_url),
            api_key: env::var("API_TOKEN").unwrap_or(defaults.provider.api_key),
            path: env::var("API_PATH").unwrap_or(defaults.provider.path),
            timeout_ms: parse_var("PROVIDER_TIMEOUT_MS", defaults.provider.timeout_ms)?,
        };
        let cache = CacheConfig {
            default_ttl_seconds: parse_var("CACHE_TTL", defaults.cache.default_ttl_seconds)?,
        };

        Ok(Self { cache, provider })
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
