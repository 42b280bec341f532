// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Block-explorer client for EVM chains.
//!
//! Talks to Etherscan-compatible HTTP APIs. Transfer lists come from the
//! per-chain explorer endpoint; balances come from the multichain endpoint
//! selected with a `chainid` parameter.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::U256;
use reqwest::Client;
use url::Url;

use super::explorer::ExplorerResponse;
use super::types::*;

/// Source of on-chain transfer history.
///
/// Implemented by [`ExplorerClient`]; the indexer only depends on this trait.
pub trait TransactionSource: Send + Sync + 'static {
    /// Fetch one page of transfers (native and tracked stablecoin) for an
    /// address, newest first.
    fn fetch_transactions(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<ChainTransfer>, ExplorerError>> + Send;
}

/// Explorer API client shared by all chains.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: Client,
    api_key: Option<String>,
}

impl ExplorerClient {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ExplorerError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Request(format!("failed to build HTTP client: {e}")))?;

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("No explorer API key configured, using the public API");
        }

        Ok(Self { http, api_key })
    }

    /// Fetch native and stablecoin transfers, degrading to an empty list on
    /// any upstream failure.
    pub async fn fetch_transactions(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> Vec<ChainTransfer> {
        match self
            .try_fetch_transactions(address, chain, page, page_size)
            .await
        {
            Ok(transfers) => transfers,
            Err(e) => {
                tracing::warn!(
                    chain_id = chain.chain_id,
                    address = %address,
                    error = %e,
                    "Failed to fetch transactions, returning empty list"
                );
                Vec::new()
            }
        }
    }

    /// Fetch native and stablecoin transfers concurrently. Native entries
    /// come first.
    pub async fn try_fetch_transactions(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ChainTransfer>, ExplorerError> {
        let (native, token) = tokio::join!(
            self.fetch_native_transfers(address, chain, page, page_size),
            self.fetch_token_transfers(address, chain, page, page_size),
        );

        let mut transfers = native?;
        transfers.extend(token?);
        Ok(transfers)
    }

    async fn fetch_native_transfers(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ChainTransfer>, ExplorerError> {
        let page = page.to_string();
        let offset = page_size.to_string();
        let url = self.build_url(
            &chain.explorer_api_url,
            &[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("page", &page),
                ("offset", &offset),
                ("sort", "desc"),
            ],
        )?;

        let transfers = self.get(url).await?.into_transfers()?;

        // txlist omits token metadata for native transfers
        Ok(transfers
            .into_iter()
            .filter_map(|t| t.normalize())
            .map(|mut t| {
                t.token_symbol = Some(chain.native.symbol.to_string());
                t.token_name = Some(chain.native.name.to_string());
                t.token_decimals = Some(chain.native.decimals);
                t
            })
            .collect())
    }

    async fn fetch_token_transfers(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ChainTransfer>, ExplorerError> {
        let page = page.to_string();
        let offset = page_size.to_string();
        let url = self.build_url(
            &chain.explorer_api_url,
            &[
                ("module", "account"),
                ("action", "tokentx"),
                ("contractaddress", chain.stablecoin.contract_address),
                ("address", address),
                ("page", &page),
                ("offset", &offset),
                ("sort", "desc"),
            ],
        )?;

        let transfers = self.get(url).await?.into_transfers()?;
        Ok(transfers.into_iter().filter_map(|t| t.normalize()).collect())
    }

    /// Native and stablecoin balance for an address. Failures degrade to a
    /// zero balance.
    pub async fn fetch_balance(&self, address: &str, chain: &ChainConfig) -> ChainBalance {
        match self.try_fetch_balance(address, chain).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(
                    chain_id = chain.chain_id,
                    address = %address,
                    error = %e,
                    "Failed to fetch balance, using zero balance"
                );
                ChainBalance::zero()
            }
        }
    }

    async fn try_fetch_balance(
        &self,
        address: &str,
        chain: &ChainConfig,
    ) -> Result<ChainBalance, ExplorerError> {
        let chain_id = chain.chain_id.to_string();

        let native_url = self.build_url(
            &chain.balance_api_url,
            &[
                ("chainid", &chain_id),
                ("module", "account"),
                ("action", "balance"),
                ("address", address),
                ("tag", "latest"),
            ],
        )?;
        let native_response = self.get(native_url).await?;
        if !native_response.is_success() && native_response.message == "NOTOK" {
            tracing::warn!(
                chain_id = chain.chain_id,
                "Native balance API returned NOTOK, using zero balance"
            );
            return Ok(ChainBalance::zero());
        }
        let native = native_response.into_balance()?;

        let token_url = self.build_url(
            &chain.balance_api_url,
            &[
                ("chainid", &chain_id),
                ("module", "account"),
                ("action", "tokenbalance"),
                ("contractaddress", chain.stablecoin.contract_address),
                ("address", address),
                ("tag", "latest"),
            ],
        )?;
        let token = match self.get(token_url).await.and_then(|r| r.into_balance()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(
                    chain_id = chain.chain_id,
                    error = %e,
                    "Token balance unavailable, using zero"
                );
                "0".to_string()
            }
        };

        Ok(ChainBalance { native, token })
    }

    fn build_url(&self, base: &str, params: &[(&str, &str)]) -> Result<Url, ExplorerError> {
        let mut url = Url::parse(base).map_err(|e| ExplorerError::InvalidUrl(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Some(api_key) = &self.api_key {
                query.append_pair("apikey", api_key);
            }
        }
        Ok(url)
    }

    // The URL carries the API key, so it is never logged.
    async fn get(&self, url: Url) -> Result<ExplorerResponse, ExplorerError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ExplorerError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(ExplorerError::Request(format!(
                "HTTP {} from explorer",
                response.status()
            )));
        }

        response
            .json::<ExplorerResponse>()
            .await
            .map_err(|e| ExplorerError::InvalidResponse(e.without_url().to_string()))
    }
}

impl TransactionSource for ExplorerClient {
    async fn fetch_transactions(
        &self,
        address: &str,
        chain: &ChainConfig,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ChainTransfer>, ExplorerError> {
        Ok(ExplorerClient::fetch_transactions(self, address, chain, page, page_size).await)
    }
}

/// Format a raw decimal amount with the specified number of decimals.
///
/// Keeps at most 6 fractional digits. Non-numeric input is returned as-is.
pub fn format_balance(raw: &str, decimals: u8) -> String {
    let Ok(balance) = raw.parse::<U256>() else {
        return raw.to_string();
    };

    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        // Truncate to 6 places first so dust below that prints as the whole part
        let truncated = &decimal_str[..decimal_str.len().min(6)];
        let trimmed = truncated.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

/// Errors that can occur while talking to an explorer API.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("Invalid explorer URL: {0}")]
    InvalidUrl(String),

    #[error("Explorer request failed: {0}")]
    Request(String),

    #[error("Explorer response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Explorer API error: {message} {detail}")]
    Upstream { message: String, detail: String },
}
