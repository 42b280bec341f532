// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction history endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{
        ChainQuery, TransactionCountResponse, TransactionListResponse, TransactionsQuery,
        TransactionsRequest,
    },
    state::AppState,
};

/// List cached transactions, filling the cache from the explorer on a miss.
///
/// With `chain_id` the history of that chain is returned, paged by offset or,
/// when `use_cursor` is set, by `(cursor_timestamp, cursor_block)`. Without
/// `chain_id` the newest `limit` rows across every supported chain are merged;
/// paging parameters are ignored in that mode.
#[utoipa::path(
    get,
    path = "/v1/transactions",
    tag = "Portfolio",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Transaction history", body = TransactionListResponse),
        (status = 400, description = "Invalid parameters or unsupported chain"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Explorer or cache failure")
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let Query(query) = query.map_err(super::bad_query)?;
    let request = query.validate()?;
    Ok(Json(transactions_for(&state, request).await?))
}

/// History lookup shared with the account endpoints.
pub(crate) async fn transactions_for(
    state: &AppState,
    request: TransactionsRequest,
) -> Result<TransactionListResponse, ApiError> {
    let TransactionsRequest {
        address,
        chain_id,
        page,
    } = request;

    match chain_id {
        Some(chain_id) => {
            let transactions = state
                .indexer
                .transactions(address.as_str(), chain_id, page)
                .await
                .map_err(|e| super::indexer_error(e, "Failed to fetch transactions"))?;
            Ok(TransactionListResponse::new(transactions, Some(page)))
        }
        None => {
            let transactions = state
                .indexer
                .transactions_all_chains(address.as_str(), page.limit())
                .await
                .map_err(|e| {
                    super::indexer_error(e, "Failed to fetch transactions from all chains")
                })?;
            Ok(TransactionListResponse::new(transactions, None))
        }
    }
}

/// Number of cached transactions for an address on one chain.
///
/// Counts only what is already cached; it never calls the explorer.
#[utoipa::path(
    get,
    path = "/v1/transactions/count",
    tag = "Portfolio",
    params(ChainQuery),
    responses(
        (status = 200, description = "Cached transaction count", body = TransactionCountResponse),
        (status = 400, description = "Invalid address or unsupported chain"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn transaction_count(
    State(state): State<AppState>,
    query: Result<Query<ChainQuery>, QueryRejection>,
) -> Result<Json<TransactionCountResponse>, ApiError> {
    let Query(query) = query.map_err(super::bad_query)?;
    let (address, chain_id) = query.validate()?;

    let count = state
        .indexer
        .count(address.as_str(), chain_id)
        .map_err(|e| super::indexer_error(e, "Failed to get transaction count"))?;

    Ok(Json(TransactionCountResponse {
        address: address.to_string(),
        chain_id,
        count,
    }))
}
