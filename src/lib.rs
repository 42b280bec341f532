// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Portfolio - Multi-Chain Wallet Portfolio Viewer
//!
//! This crate serves read-only balances, transaction history and token
//! prices for wallet addresses on EVM test networks. Transfer history is
//! pulled from block-explorer APIs on demand and cached in an embedded
//! database.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Optional wallet bearer authentication
//! - `blockchain` - Chain configuration and the block-explorer client
//! - `indexer` - Cache-or-fetch orchestration of transaction history
//! - `providers` - Token price feed
//! - `ratelimit` - Fixed-window rate limiting
//! - `storage` - Transaction cache (redb)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod providers;
pub mod ratelimit;
pub mod state;
pub mod storage;

use config::LogFormat;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Install the global tracing subscriber.
pub fn setup_tracing(format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => subscriber.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => subscriber.with(fmt::layer()).try_init(),
    }
}
