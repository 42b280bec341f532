// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API, plus the
//! validation that turns raw query strings into typed requests.
//!
//! Numeric query fields are parsed as signed integers so that negative or
//! zero values reach validation and get a precise error message instead of
//! a generic deserialization failure.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    blockchain::TokenBalance,
    error::ApiError,
    indexer::HistoryPage,
    storage::{HistoryCursor, StoredTransaction},
};

/// Default page size for transaction history.
pub const DEFAULT_TX_LIMIT: usize = 12;
/// Largest accepted page size.
pub const MAX_TX_LIMIT: usize = 500;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes). Case is
/// preserved; comparisons that need to ignore case use [`WalletAddress::matches`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Validate and wrap an address.
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        if value.is_empty() {
            return Err(ApiError::bad_request("Address is required"));
        }
        if !is_valid_address(value) {
            return Err(ApiError::bad_request(
                "Invalid Ethereum address format. Must be 0x followed by 40 hexadecimal characters",
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether `value` matches `^0x[a-fA-F0-9]{40}$`.
pub fn is_valid_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_chain_id(raw: i64) -> Result<u64, ApiError> {
    u64::try_from(raw)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Chain ID must be positive"))
}

// =============================================================================
// Requests
// =============================================================================

/// Address on one chain (balance and count lookups).
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChainQuery {
    /// Wallet address (0x + 40 hex characters)
    pub address: Option<String>,
    /// Chain ID (must be a supported chain)
    pub chain_id: Option<i64>,
}

impl ChainQuery {
    pub fn validate(&self) -> Result<(WalletAddress, u64), ApiError> {
        let address = WalletAddress::parse(self.address.as_deref().unwrap_or_default())?;
        let chain_id = self
            .chain_id
            .ok_or_else(|| ApiError::bad_request("Chain ID is required"))
            .and_then(parse_chain_id)?;
        Ok((address, chain_id))
    }
}

/// Address on one chain, for authenticated callers. The address defaults
/// to the token's address.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccountChainQuery {
    /// Wallet address; defaults to the authenticated address
    pub address: Option<String>,
    /// Chain ID (must be a supported chain)
    pub chain_id: Option<i64>,
}

/// Transaction history request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionsQuery {
    /// Wallet address (0x + 40 hex characters)
    pub address: Option<String>,
    /// Chain ID; omit to merge every supported chain
    pub chain_id: Option<i64>,
    /// Page size, 1 to 500
    #[param(default = 12)]
    pub limit: Option<i64>,
    /// Rows to skip (offset pagination)
    #[param(default = 0)]
    pub offset: Option<i64>,
    /// Use keyset pagination instead of offset
    #[param(default = false)]
    pub use_cursor: Option<bool>,
    /// Cursor: return rows older than this unix timestamp
    pub cursor_timestamp: Option<i64>,
    /// Cursor: return rows below this block number
    pub cursor_block: Option<i64>,
}

/// Validated transaction history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsRequest {
    pub address: WalletAddress,
    pub chain_id: Option<u64>,
    pub page: HistoryPage,
}

impl TransactionsQuery {
    /// Validate with an explicit address (used when the address comes from
    /// somewhere other than the query string).
    pub fn validate_for(&self, address: WalletAddress) -> Result<TransactionsRequest, ApiError> {
        let chain_id = self.chain_id.map(parse_chain_id).transpose()?;

        let limit = match self.limit {
            None => DEFAULT_TX_LIMIT,
            Some(l) if l < 1 => return Err(ApiError::bad_request("Limit must be at least 1")),
            Some(l) if l > MAX_TX_LIMIT as i64 => {
                return Err(ApiError::bad_request("Limit cannot exceed 500"))
            }
            Some(l) => l as usize,
        };

        let offset = match self.offset {
            None => 0,
            Some(o) if o < 0 => return Err(ApiError::bad_request("Offset must be non-negative")),
            Some(o) => usize::try_from(o).unwrap_or(usize::MAX),
        };

        let cursor = match (self.cursor_timestamp, self.cursor_block) {
            (None, None) => None,
            (Some(ts), Some(block)) => {
                if ts <= 0 {
                    return Err(ApiError::bad_request("Timestamp must be positive"));
                }
                if block <= 0 {
                    return Err(ApiError::bad_request("Block number must be positive"));
                }
                Some(HistoryCursor {
                    timestamp: ts as u64,
                    block_number: block as u64,
                })
            }
            _ => {
                return Err(ApiError::bad_request(
                    "Cursor requires both cursor_timestamp and cursor_block",
                ))
            }
        };

        let page = if self.use_cursor.unwrap_or(false) {
            HistoryPage::Cursor { limit, cursor }
        } else {
            HistoryPage::Offset { limit, offset }
        };

        Ok(TransactionsRequest {
            address,
            chain_id,
            page,
        })
    }

    pub fn validate(&self) -> Result<TransactionsRequest, ApiError> {
        let address = WalletAddress::parse(self.address.as_deref().unwrap_or_default())?;
        self.validate_for(address)
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Balances on one chain valued in USD.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: String,
    pub chain_id: u64,
    /// Network name for display
    pub chain_name: String,
    /// Address page on the chain's block explorer
    pub explorer_url: String,
    /// Native coin balance
    pub native: TokenBalance,
    /// Tracked stablecoin balance
    pub stablecoin: TokenBalance,
    /// Sum of both USD values
    pub total_usd: f64,
}

/// Position to continue keyset pagination from.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct NextCursor {
    pub timestamp: u64,
    pub block_number: u64,
}

/// Transaction history page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Transactions, newest first
    pub transactions: Vec<StoredTransaction>,
    /// Present when keyset pagination filled the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<NextCursor>,
}

impl TransactionListResponse {
    pub fn new(transactions: Vec<StoredTransaction>, page: Option<HistoryPage>) -> Self {
        let next_cursor = match page {
            Some(HistoryPage::Cursor { limit, .. }) if transactions.len() >= limit => {
                transactions.last().map(|tx| NextCursor {
                    timestamp: tx.timestamp,
                    block_number: tx.block_number,
                })
            }
            _ => None,
        };
        Self {
            transactions,
            next_cursor,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionCountResponse {
    pub address: String,
    pub chain_id: u64,
    /// Number of cached transactions
    pub count: u64,
}
