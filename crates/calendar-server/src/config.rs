use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    pub max_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
            max_clients: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 10,
            port: 3001,
            cors_origins: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = RateLimitConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            cors_origins: parse_origins(&env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string())),
            rate_limit: RateLimitConfig {
                max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                    .map(|v| v.parse())
                    .unwrap_or(Ok(defaults.max_requests))
                    .context("RATE_LIMIT_MAX_REQUESTS must be a number")?,
                window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                    .map(|v| v.parse())
                    .unwrap_or(Ok(defaults.window_secs))
                    .context("RATE_LIMIT_WINDOW_SECS must be a number")?,
                max_clients: env::var("RATE_LIMIT_MAX_CLIENTS")
                    .map(|v| v.parse())
                    .unwrap_or(Ok(defaults.max_clients))
                    .context("RATE_LIMIT_MAX_CLIENTS must be a number")?,
            },
        })
    }
}

/// `*` (or nothing) means any origin; otherwise a comma separated list.
fn parse_origins(raw: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        None
    } else {
        Some(origins)
    }
}
