// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-style explorer response envelope.
//!
//! Every explorer call answers with `{status, message, result}`. `status`
//! is `"1"` on success; on failure `result` is usually a human-readable
//! string rather than the payload type, so it is kept as raw JSON until the
//! status has been checked.

use serde::Deserialize;
use serde_json::Value;

use super::client::ExplorerError;
use super::types::ChainTransfer;

/// Messages that mean "nothing to return" rather than a failure.
const EMPTY_RESULT_MESSAGES: [&str; 3] = ["No transactions found", "No records found", "NOTOK"];

#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl ExplorerResponse {
    pub fn is_success(&self) -> bool {
        self.status == "1"
    }

    /// Whether a non-success response only signals an empty result.
    pub fn is_empty_result(&self) -> bool {
        EMPTY_RESULT_MESSAGES
            .iter()
            .any(|m| self.message.eq_ignore_ascii_case(m))
    }

    /// Decode a transfer list, treating "no results" sentinels as empty.
    pub fn into_transfers(self) -> Result<Vec<ExplorerTransfer>, ExplorerError> {
        if self.is_success() {
            return serde_json::from_value(self.result)
                .map_err(|e| ExplorerError::InvalidResponse(e.to_string()));
        }
        if self.is_empty_result() {
            return Ok(Vec::new());
        }
        Err(self.into_upstream_error())
    }

    /// Decode a scalar balance result (decimal string in smallest units).
    pub fn into_balance(self) -> Result<String, ExplorerError> {
        if !self.is_success() {
            return Err(self.into_upstream_error());
        }
        match self.result {
            Value::String(raw) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(raw)
            }
            other => Err(ExplorerError::InvalidResponse(format!(
                "unexpected balance result: {other}"
            ))),
        }
    }

    fn into_upstream_error(self) -> ExplorerError {
        let detail = match self.result {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        ExplorerError::Upstream {
            message: self.message,
            detail,
        }
    }
}

/// Transfer entry as returned by `txlist` and `tokentx`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTransfer {
    pub hash: String,
    pub block_number: String,
    pub time_stamp: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub token_decimal: Option<String>,
}

impl ExplorerTransfer {
    /// Normalize into a [`ChainTransfer`]. Entries whose block number or
    /// timestamp are not integers are dropped.
    pub fn normalize(self) -> Option<ChainTransfer> {
        let block_number = self.block_number.trim().parse::<u64>().ok()?;
        let timestamp = self.time_stamp.trim().parse::<u64>().ok()?;

        Some(ChainTransfer {
            hash: self.hash,
            block_number,
            timestamp,
            from: self.from,
            to: self.to,
            value: self.value,
            token_symbol: non_empty(self.token_symbol),
            token_name: non_empty(self.token_name),
            token_decimals: self.token_decimal.and_then(|d| d.trim().parse().ok()),
            contract_address: non_empty(self.contract_address),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
