// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

pub mod coingecko;

pub use coingecko::{
    usd_value, AssetPrice, PriceFeed, PriceFeedError, PriceFeedMode, PriceQuote,
};
