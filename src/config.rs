use alloy_primitives::Address;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_BRIDGE_ADDRESS: &str = "0x2a3dd3eb832af982ec71669e178424b10dca2ede";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: Option<String>,
    pub bridge_address: Address,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub cache_ttl: Duration,
    pub event_limit: usize,
    pub explorer_overrides: HashMap<u32, String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let bridge_address_str = std::env::var("BRIDGE_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BRIDGE_ADDRESS.to_string());
        let bridge_address = Address::from_str(&bridge_address_str)
            .context("Invalid BRIDGE_ADDRESS format")?;

        let page_size = env_number("PAGE_SIZE", 5)?;
        if page_size == 0 {
            anyhow::bail!("PAGE_SIZE must be at least 1");
        }

        let explorer_overrides = match std::env::var("EXPLORER_URLS") {
            Ok(raw) => parse_explorer_overrides(&raw)?,
            Err(_) => HashMap::new(),
        };

        Ok(Config {
            api_base_url,
            database_url,
            bridge_address,
            page_size,
            request_timeout: Duration::from_secs(env_number("REQUEST_TIMEOUT_SECS", 10)? as u64),
            max_concurrent_requests: env_number("MAX_CONCURRENT_REQUESTS", 8)?.max(1),
            cache_ttl: Duration::from_secs(env_number("CACHE_TTL_SECS", 300)? as u64),
            event_limit: env_number("EVENT_LIMIT", 5000)?,
            explorer_overrides,
        })
    }
}

fn env_number(name: &str, default: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a non-negative integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// `EXPLORER_URLS="0=https://etherscan.io,5=https://explorer.example"`
pub fn parse_explorer_overrides(raw: &str) -> Result<HashMap<u32, String>> {
    let re = Regex::new(r"^\s*(\d+)\s*=\s*(https?://\S+?)\s*$")?;
    let mut overrides = HashMap::new();

    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        let captures = re
            .captures(entry)
            .with_context(|| format!("Invalid EXPLORER_URLS entry: {entry:?}"))?;
        let id: u32 = captures[1]
            .parse()
            .with_context(|| format!("Invalid network id in EXPLORER_URLS: {entry:?}"))?;
        overrides.insert(id, captures[2].to_string());
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explorer_overrides() {
        let overrides =
            parse_explorer_overrides("0=https://etherscan.io, 5 = https://explorer.example")
                .unwrap();
        assert_eq!(overrides[&0], "https://etherscan.io");
        assert_eq!(overrides[&5], "https://explorer.example");
        assert!(parse_explorer_overrides("").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_explorer_overrides() {
        assert!(parse_explorer_overrides("zero=https://etherscan.io").is_err());
        assert!(parse_explorer_overrides("1=ftp://example").is_err());
    }
}
