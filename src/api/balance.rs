// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance query endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::{
    blockchain::{format_balance, ChainConfig, TokenBalance},
    error::ApiError,
    models::{BalanceResponse, ChainQuery, WalletAddress},
    providers::usd_value,
    state::AppState,
};

/// Get the native and stablecoin balances of an address on one chain.
///
/// Explorer failures degrade to zero balances; price failures fall back to
/// the static price pair.
#[utoipa::path(
    get,
    path = "/v1/balance",
    tag = "Portfolio",
    params(ChainQuery),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 400, description = "Invalid address or unsupported chain"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    query: Result<Query<ChainQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Query(query) = query.map_err(super::bad_query)?;
    let (address, chain_id) = query.validate()?;
    Ok(Json(balance_for(&state, &address, chain_id).await?))
}

/// Balance lookup shared with the account endpoints.
pub(crate) async fn balance_for(
    state: &AppState,
    address: &WalletAddress,
    chain_id: u64,
) -> Result<BalanceResponse, ApiError> {
    let chain = state.chains.ensure_supported(chain_id)?;

    let (raw, quote) = tokio::join!(
        state.explorer.fetch_balance(address.as_str(), chain),
        state.prices.quote_or_fallback(),
    );

    let native = native_balance(chain, &raw.native, quote.native.usd);
    let stablecoin = stablecoin_balance(chain, &raw.token, quote.stable.usd);
    let total_usd = native.usd_value + stablecoin.usd_value;

    Ok(BalanceResponse {
        address: address.to_string(),
        chain_id,
        chain_name: chain.name.to_string(),
        explorer_url: format!("{}/address/{}", chain.explorer_url, address),
        native,
        stablecoin,
        total_usd,
    })
}

fn native_balance(chain: &ChainConfig, raw: &str, unit_price: f64) -> TokenBalance {
    let asset = &chain.native;
    TokenBalance {
        symbol: asset.symbol.to_string(),
        name: asset.name.to_string(),
        balance_raw: raw.to_string(),
        balance_formatted: format_balance(raw, asset.decimals),
        decimals: asset.decimals,
        contract_address: None,
        usd_value: usd_value(raw, asset.decimals, unit_price),
    }
}

fn stablecoin_balance(chain: &ChainConfig, raw: &str, unit_price: f64) -> TokenBalance {
    let token = &chain.stablecoin;
    TokenBalance {
        symbol: token.symbol.to_string(),
        name: token.name.to_string(),
        balance_raw: raw.to_string(),
        balance_formatted: format_balance(raw, token.decimals),
        decimals: token.decimals,
        contract_address: Some(token.contract_address.to_string()),
        usd_value: usd_value(raw, token.decimals, unit_price),
    }
}
