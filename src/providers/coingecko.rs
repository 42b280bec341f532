// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CoinGecko USD price feed for the native coin and the tracked stablecoin.
//!
//! Two modes: `Live` asks CoinGecko on every call (no caching), `Static`
//! serves a fixed fallback pair without touching the network.

use std::{collections::HashMap, str::FromStr, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const PUBLIC_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PRO_API_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

const NATIVE_ASSET_ID: &str = "ethereum";
const STABLE_ASSET_ID: &str = "usd-coin";

/// Native coin price served when no live quote is available.
pub const FALLBACK_NATIVE_USD: f64 = 2400.0;
/// Stablecoin price served when no live quote is available.
pub const FALLBACK_STABLE_USD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceFeedMode {
    #[default]
    Static,
    Live,
}

impl PriceFeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceFeedMode::Static => "static",
            PriceFeedMode::Live => "live",
        }
    }
}

impl FromStr for PriceFeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown price feed mode: {other}")),
        }
    }
}

/// USD unit price of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetPrice {
    pub usd: f64,
    /// Unix timestamp (seconds) of the quote
    pub last_updated_at: i64,
}

/// Prices for the native coin and the stablecoin, keyed like CoinGecko.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    #[serde(rename = "ethereum")]
    pub native: AssetPrice,
    #[serde(rename = "usd-coin")]
    pub stable: AssetPrice,
}

impl PriceQuote {
    /// The fixed fallback pair, stamped with the current time.
    pub fn fallback() -> Self {
        let now = Utc::now().timestamp();
        Self {
            native: AssetPrice {
                usd: FALLBACK_NATIVE_USD,
                last_updated_at: now,
            },
            stable: AssetPrice {
                usd: FALLBACK_STABLE_USD,
                last_updated_at: now,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PriceFeedError {
    #[error("Price request failed: {0}")]
    Request(String),

    #[error("Price API returned HTTP {0}")]
    Status(u16),

    #[error("Price response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Price response is missing asset {0}")]
    MissingAsset(&'static str),
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: f64,
    #[serde(default)]
    last_updated_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PriceFeed {
    mode: PriceFeedMode,
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl PriceFeed {
    /// Build a feed. A configured key switches to the pro host.
    pub fn new(
        mode: PriceFeedMode,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PriceFeedError> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let base_url = if api_key.is_some() {
            PRO_API_BASE_URL
        } else {
            PUBLIC_API_BASE_URL
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PriceFeedError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            mode,
            base_url: base_url.to_string(),
            api_key,
            http,
        })
    }

    /// Point the feed at another CoinGecko-compatible host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn mode(&self) -> PriceFeedMode {
        self.mode
    }

    /// Current prices. In live mode every failure is returned to the caller.
    pub async fn quote(&self) -> Result<PriceQuote, PriceFeedError> {
        match self.mode {
            PriceFeedMode::Static => Ok(PriceQuote::fallback()),
            PriceFeedMode::Live => self.fetch_live().await,
        }
    }

    /// Current prices, degrading to the fallback pair on failure.
    pub async fn quote_or_fallback(&self) -> PriceQuote {
        match self.quote().await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(error = %e, "Price lookup failed, using fallback prices");
                PriceQuote::fallback()
            }
        }
    }

    async fn fetch_live(&self) -> Result<PriceQuote, PriceFeedError> {
        let url = format!("{}/simple/price", self.base_url);
        let mut query = vec![
            ("ids", format!("{NATIVE_ASSET_ID},{STABLE_ASSET_ID}")),
            ("vs_currencies", "usd".to_string()),
            ("include_last_updated_at", "true".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("x_cg_pro_api_key", key.clone()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PriceFeedError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(PriceFeedError::Status(response.status().as_u16()));
        }

        let mut prices: HashMap<String, SimplePrice> = response
            .json()
            .await
            .map_err(|e| PriceFeedError::InvalidResponse(e.without_url().to_string()))?;

        let now = Utc::now().timestamp();
        let mut take = |id: &'static str| {
            prices
                .remove(id)
                .map(|p| AssetPrice {
                    usd: p.usd,
                    last_updated_at: p.last_updated_at.unwrap_or(now),
                })
                .ok_or(PriceFeedError::MissingAsset(id))
        };

        Ok(PriceQuote {
            native: take(NATIVE_ASSET_ID)?,
            stable: take(STABLE_ASSET_ID)?,
        })
    }
}

/// USD value of a raw amount: `amount_raw / 10^decimals * unit_price`.
///
/// An amount that does not parse as a number counts as zero.
pub fn usd_value(amount_raw: &str, decimals: u8, unit_price: f64) -> f64 {
    let amount = amount_raw.trim().parse::<f64>().unwrap_or(0.0);
    if !amount.is_finite() {
        return 0.0;
    }
    amount / 10f64.powi(i32::from(decimals)) * unit_price
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{extract::RawQuery, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn fake_coingecko(status: StatusCode, body: Value) -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let app = Router::new().route(
            "/api/v3/simple/price",
            get(move |RawQuery(query): RawQuery| {
                let log = log.clone();
                let body = body.clone();
                async move {
                    log.lock().unwrap().push(query.unwrap_or_default());
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/api/v3"), seen)
    }

    fn live_feed(api_key: Option<&str>, base_url: &str) -> PriceFeed {
        PriceFeed::new(
            PriceFeedMode::Live,
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url)
    }

    #[test]
    fn usd_value_examples() {
        assert_eq!(usd_value("1000000000000000000", 18, 2400.0), 2400.0);
        assert_eq!(usd_value("1000000000000000000", 18, 2000.5), 2000.5);
        assert_eq!(usd_value("1500000", 6, 1.0), 1.5);
        assert_eq!(usd_value("0", 18, 2400.0), 0.0);
        assert_eq!(usd_value("garbage", 6, 1.0), 0.0);
    }

    #[test]
    fn zero_price_is_worth_nothing() {
        assert_eq!(usd_value("123456789", 6, 0.0), 0.0);
        assert_eq!(usd_value("1000000000000000000", 18, 0.0), 0.0);
        assert_eq!(usd_value("0", 18, 0.0), 0.0);
    }

    #[test]
    fn parses_mode() {
        assert_eq!("live".parse::<PriceFeedMode>().unwrap(), PriceFeedMode::Live);
        assert_eq!(" Static ".parse::<PriceFeedMode>().unwrap(), PriceFeedMode::Static);
        assert!("cached".parse::<PriceFeedMode>().is_err());
    }

    #[test]
    fn key_selects_pro_host() {
        let public = PriceFeed::new(PriceFeedMode::Live, None, Duration::from_secs(1)).unwrap();
        assert_eq!(public.base_url, PUBLIC_API_BASE_URL);

        let pro = PriceFeed::new(
            PriceFeedMode::Live,
            Some("test-api-key".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(pro.base_url, PRO_API_BASE_URL);
    }

    #[tokio::test]
    async fn static_mode_returns_fallback_pair() {
        let feed = PriceFeed::new(PriceFeedMode::Static, None, Duration::from_secs(1)).unwrap();
        let quote = feed.quote().await.unwrap();
        assert_eq!(quote.native.usd, FALLBACK_NATIVE_USD);
        assert_eq!(quote.stable.usd, FALLBACK_STABLE_USD);
        assert!(quote.native.last_updated_at > 0);
    }

    #[tokio::test]
    async fn live_quote_parses_response() {
        let (base, seen) = fake_coingecko(
            StatusCode::OK,
            json!({
                "ethereum": {"usd": 2000.5, "last_updated_at": 1700000000},
                "usd-coin": {"usd": 1.0}
            }),
        )
        .await;

        let quote = live_feed(None, &base).quote().await.unwrap();
        assert_eq!(quote.native.usd, 2000.5);
        assert_eq!(quote.native.last_updated_at, 1700000000);
        assert_eq!(quote.stable.usd, 1.0);

        let queries = seen.lock().unwrap();
        assert!(queries[0].contains("ids=ethereum%2Cusd-coin"));
        assert!(queries[0].contains("vs_currencies=usd"));
        assert!(!queries[0].contains("x_cg_pro_api_key"));
    }

    #[tokio::test]
    async fn live_quote_sends_pro_key() {
        let (base, seen) = fake_coingecko(
            StatusCode::OK,
            json!({"ethereum": {"usd": 1.0}, "usd-coin": {"usd": 1.0}}),
        )
        .await;

        live_feed(Some("test-api-key"), &base).quote().await.unwrap();
        assert!(seen.lock().unwrap()[0].contains("x_cg_pro_api_key=test-api-key"));
    }

    #[tokio::test]
    async fn live_quote_rejects_error_status_and_missing_asset() {
        let (base, _) = fake_coingecko(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
        let err = live_feed(None, &base).quote().await.unwrap_err();
        assert!(matches!(err, PriceFeedError::Status(429)));

        let (base, _) = fake_coingecko(StatusCode::OK, json!({"ethereum": {"usd": 1.0}})).await;
        let err = live_feed(None, &base).quote().await.unwrap_err();
        assert!(matches!(err, PriceFeedError::MissingAsset("usd-coin")));
    }

    #[tokio::test]
    async fn quote_or_fallback_degrades() {
        let feed = live_feed(None, "http://127.0.0.1:9/api/v3");
        assert!(feed.quote().await.is_err());

        let quote = feed.quote_or_fallback().await;
        assert_eq!(quote.native.usd, FALLBACK_NATIVE_USD);
        assert_eq!(quote.stable.usd, FALLBACK_STABLE_USD);
    }

    #[test]
    fn quote_serializes_with_asset_ids() {
        let quote = PriceQuote {
            native: AssetPrice {
                usd: 2400.0,
                last_updated_at: 1,
            },
            stable: AssetPrice {
                usd: 1.0,
                last_updated_at: 1,
            },
        };
        let value = serde_json::to_value(quote).unwrap();
        assert_eq!(value["ethereum"]["usd"], 2400.0);
        assert_eq!(value["usd-coin"]["usd"], 1.0);
    }
}
