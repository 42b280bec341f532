// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated variants of the portfolio endpoints.
//!
//! The address defaults to the one in the bearer token and, when given,
//! must be that same address.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::{
    auth::{AuthenticatedWallet, WalletAuth},
    error::ApiError,
    models::{
        AccountChainQuery, BalanceResponse, ChainQuery, TransactionListResponse,
        TransactionsQuery, WalletAddress,
    },
    state::AppState,
};

/// Resolve the requested address against the authenticated wallet.
fn owned_address(
    wallet: &AuthenticatedWallet,
    requested: Option<&str>,
) -> Result<WalletAddress, ApiError> {
    let address = WalletAddress::parse(requested.unwrap_or(&wallet.address))?;
    wallet.ensure_owns(address.as_str())?;
    Ok(address)
}

/// Balance of the authenticated wallet on one chain.
#[utoipa::path(
    get,
    path = "/v1/account/balance",
    tag = "Account",
    params(AccountChainQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 400, description = "Invalid address or unsupported chain"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Address does not belong to the caller"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn account_balance(
    WalletAuth(wallet): WalletAuth,
    State(state): State<AppState>,
    query: Result<Query<AccountChainQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Query(query) = query.map_err(super::bad_query)?;
    let address = owned_address(&wallet, query.address.as_deref())?;
    let (address, chain_id) = ChainQuery {
        address: Some(address.0),
        chain_id: query.chain_id,
    }
    .validate()?;

    Ok(Json(
        super::balance::balance_for(&state, &address, chain_id).await?,
    ))
}

/// Transaction history of the authenticated wallet.
#[utoipa::path(
    get,
    path = "/v1/account/transactions",
    tag = "Account",
    params(TransactionsQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction history", body = TransactionListResponse),
        (status = 400, description = "Invalid parameters or unsupported chain"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Address does not belong to the caller"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Explorer or cache failure")
    )
)]
pub async fn account_transactions(
    WalletAuth(wallet): WalletAuth,
    State(state): State<AppState>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let Query(query) = query.map_err(super::bad_query)?;
    let address = owned_address(&wallet, query.address.as_deref())?;
    let request = query.validate_for(address)?;

    Ok(Json(
        super::transactions::transactions_for(&state, request).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    const OWNER: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    fn wallet() -> AuthenticatedWallet {
        AuthenticatedWallet {
            address: OWNER.to_string(),
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_to_token_address() {
        let address = owned_address(&wallet(), None).unwrap();
        assert_eq!(address.as_str(), OWNER);
    }

    #[test]
    fn accepts_own_address_in_any_case() {
        let lower = OWNER.to_lowercase();
        let address = owned_address(&wallet(), Some(&lower)).unwrap();
        assert_eq!(address.as_str(), lower);
    }

    #[test]
    fn rejects_other_addresses() {
        let err = owned_address(
            &wallet(),
            Some("0x0000000000000000000000000000000000000001"),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.error_code, Some("address_mismatch"));

        let err = owned_address(&wallet(), Some("nope")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
