//! Gateway configuration
//!
//! Loaded once at startup from environment variables (a `.env` file is read first
//! by `dotenvy` in `main`). Nothing here is mutated after `from_env` returns.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use reqwest::Url;

use crate::error::GatewayError;

const DEFAULT_PORT: u16 = 8082;
const DEFAULT_EXECUTE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 5_000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the Judge0-compatible service (e.g. https://ce.judge0.com)
    pub judge_url: Url,
    /// Optional `X-Auth-Token` for self-hosted judge instances
    pub judge_auth_token: Option<String>,
    /// Upper bound on a single execution call (default: 30s)
    pub execute_timeout: Duration,
    /// Upper bound on language catalog calls used by health/languages (default: 5s)
    pub catalog_timeout: Duration,
    /// Listen address
    pub bind_addr: SocketAddr,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
}

impl GatewayConfig {
    /// Create a config pointing at `judge_url` with every other field defaulted
    pub fn new(judge_url: Url) -> Self {
        Self {
            judge_url,
            judge_auth_token: None,
            execute_timeout: Duration::from_millis(DEFAULT_EXECUTE_TIMEOUT_MS),
            catalog_timeout: Duration::from_millis(DEFAULT_CATALOG_TIMEOUT_MS),
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            cors_allowed_origins: Vec::new(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = var("JUDGE0_URL")
            .ok_or_else(|| GatewayError::Configuration("JUDGE0_URL is not set".into()))?;
        let judge_url = Url::parse(raw_url.trim()).map_err(|e| {
            GatewayError::Configuration(format!("Invalid JUDGE0_URL {}: {}", raw_url, e))
        })?;
        if !matches!(judge_url.scheme(), "http" | "https") {
            return Err(GatewayError::Configuration(format!(
                "JUDGE0_URL must be http or https: {}",
                raw_url
            )));
        }

        let mut config = Self::new(judge_url);
        config.judge_auth_token = var("JUDGE0_AUTH_TOKEN");

        if let Some(ms) = var("EXECUTE_TIMEOUT_MS") {
            config.execute_timeout = parse_timeout("EXECUTE_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = var("CATALOG_TIMEOUT_MS") {
            config.catalog_timeout = parse_timeout("CATALOG_TIMEOUT_MS", &ms)?;
        }

        let ip = match var("BIND_ADDR") {
            Some(addr) => addr.trim().parse::<IpAddr>().map_err(|e| {
                GatewayError::Configuration(format!("Invalid BIND_ADDR {}: {}", addr, e))
            })?,
            None => config.bind_addr.ip(),
        };
        let port = match var("PORT") {
            Some(port) => match port.trim().parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => {
                    return Err(GatewayError::Configuration(format!(
                        "Invalid PORT: {}",
                        port
                    )))
                }
            },
            None => DEFAULT_PORT,
        };
        config.bind_addr = SocketAddr::new(ip, port);

        if let Some(origins) = var("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(config)
    }
}

fn parse_timeout(key: &str, raw: &str) -> Result<Duration, GatewayError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(GatewayError::Configuration(format!(
            "{} must be a positive number of milliseconds: {}",
            key, raw
        ))),
    }
}
