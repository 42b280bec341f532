// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module for EVM test networks.
//!
//! This module provides functionality for:
//! - Static chain configuration (explorer endpoints, tracked stablecoin)
//! - Fetching native and stablecoin transfer history from explorer APIs
//! - Querying native and stablecoin balances

pub mod client;
pub mod explorer;
pub mod types;

pub use client::{format_balance, ExplorerClient, ExplorerError, TransactionSource};
pub use types::*;
