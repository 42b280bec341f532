// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup into an
//! [`AppConfig`] that is shared through the application state.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `transactions.redb` | `./data` |
//! | `ETHERSCAN_API_KEY` | Explorer API key | unset (unauthenticated, heavily throttled) |
//! | `PRICE_FEED_MODE` | `static` or `live` | `static` |
//! | `COINGECKO_API_KEY` | CoinGecko key; selects the pro host | unset |
//! | `UPSTREAM_TIMEOUT_SECS` | Timeout for explorer and price calls | `15` |
//! | `RATE_LIMIT_WINDOW_SECS` | Fixed rate-limit window | `60` |
//! | `RATE_LIMIT_PUBLIC_MAX` | Requests per window, public endpoints | `300` |
//! | `RATE_LIMIT_PROTECTED_MAX` | Requests per window, account endpoints | `100` |
//! | `CORS_ORIGIN` | Allowed origins, comma separated | any origin |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Unparseable numeric values are logged and replaced by their default.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use crate::{providers::PriceFeedMode, ratelimit::RateLimitTier};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const PRICE_FEED_MODE_ENV: &str = "PRICE_FEED_MODE";
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const RATE_LIMIT_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
pub const RATE_LIMIT_PUBLIC_MAX_ENV: &str = "RATE_LIMIT_PUBLIC_MAX";
pub const RATE_LIMIT_PROTECTED_MAX_ENV: &str = "RATE_LIMIT_PROTECTED_MAX";
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
/// `json` selects structured JSON logs; anything else is human readable.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
/// File name of the transaction cache inside the data directory.
pub const TX_DATABASE_FILE: &str = "transactions.redb";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` on its own, so logging can start before the rest of
    /// the configuration is parsed.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub etherscan_api_key: Option<String>,
    pub price_feed_mode: PriceFeedMode,
    pub coingecko_api_key: Option<String>,
    pub upstream_timeout: Duration,
    pub rate_limit_window: Duration,
    pub public_max_requests: u32,
    pub protected_max_requests: u32,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var(HOST_ENV)
            .and_then(|h| match h.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(value = %h, "Invalid {HOST_ENV}, binding to 0.0.0.0");
                    None
                }
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = parse_or(PORT_ENV, var(PORT_ENV), DEFAULT_PORT);

        let price_feed_mode = parse_or(
            PRICE_FEED_MODE_ENV,
            var(PRICE_FEED_MODE_ENV),
            PriceFeedMode::default(),
        );

        let log_format = LogFormat::parse(var(LOG_FORMAT_ENV).as_deref());

        let cors_origins = var(CORS_ORIGIN_ENV)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty() && *o != "*")
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_addr: SocketAddr::new(host, port),
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            etherscan_api_key: var(ETHERSCAN_API_KEY_ENV),
            price_feed_mode,
            coingecko_api_key: var(COINGECKO_API_KEY_ENV),
            upstream_timeout: Duration::from_secs(parse_or(
                UPSTREAM_TIMEOUT_ENV,
                var(UPSTREAM_TIMEOUT_ENV),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
            rate_limit_window: Duration::from_secs(parse_or(
                RATE_LIMIT_WINDOW_ENV,
                var(RATE_LIMIT_WINDOW_ENV),
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )),
            public_max_requests: parse_or(
                RATE_LIMIT_PUBLIC_MAX_ENV,
                var(RATE_LIMIT_PUBLIC_MAX_ENV),
                RateLimitTier::Public.default_max_requests(),
            ),
            protected_max_requests: parse_or(
                RATE_LIMIT_PROTECTED_MAX_ENV,
                var(RATE_LIMIT_PROTECTED_MAX_ENV),
                RateLimitTier::Protected.default_max_requests(),
            ),
            cors_origins,
            log_format,
        }
    }

    /// Path of the redb transaction cache.
    pub fn tx_database_path(&self) -> PathBuf {
        self.data_dir.join(TX_DATABASE_FILE)
    }
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.tx_database_path(), PathBuf::from("./data/transactions.redb"));
        assert_eq!(cfg.price_feed_mode, PriceFeedMode::Static);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(15));
        assert_eq!(cfg.rate_limit_window, Duration::from_secs(60));
        assert_eq!(cfg.public_max_requests, 300);
        assert_eq!(cfg.protected_max_requests, 100);
        assert!(cfg.cors_origins.is_empty());
        assert!(cfg.etherscan_api_key.is_none());
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("DATA_DIR", "/var/lib/portfolio"),
            ("ETHERSCAN_API_KEY", "key"),
            ("PRICE_FEED_MODE", "live"),
            ("RATE_LIMIT_PUBLIC_MAX", "10"),
            ("CORS_ORIGIN", "https://a.example, https://b.example"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/portfolio"));
        assert_eq!(cfg.etherscan_api_key.as_deref(), Some("key"));
        assert_eq!(cfg.price_feed_mode, PriceFeedMode::Live);
        assert_eq!(cfg.public_max_requests, 10);
        assert_eq!(
            cfg.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let cfg = config(&[
            ("PORT", "eighty"),
            ("UPSTREAM_TIMEOUT_SECS", "-1"),
            ("RATE_LIMIT_PROTECTED_MAX", "lots"),
        ]);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(15));
        assert_eq!(cfg.protected_max_requests, 100);
    }

    #[test]
    fn blank_values_are_unset() {
        let cfg = config(&[("ETHERSCAN_API_KEY", "  "), ("CORS_ORIGIN", "*")]);
        assert!(cfg.etherscan_api_key.is_none());
        assert!(cfg.cors_origins.is_empty());
    }
}
