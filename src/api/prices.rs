// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{error::ApiError, providers::PriceQuote, state::AppState};

/// Current USD prices of the native coin and the stablecoin.
///
/// Unlike the balance endpoint this does not fall back: a failed live lookup
/// is reported as an error.
#[utoipa::path(
    get,
    path = "/v1/prices",
    tag = "Portfolio",
    responses(
        (status = 200, description = "Token prices keyed by asset id", body = PriceQuote),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Price source unavailable")
    )
)]
pub async fn get_prices(State(state): State<AppState>) -> Result<Json<PriceQuote>, ApiError> {
    let quote = state.prices.quote().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch token prices");
        ApiError::internal("Failed to fetch token prices")
    })?;
    Ok(Json(quote))
}
