// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::rejection::QueryRejection,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, Request,
    },
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::TokenBalance,
    config::AppConfig,
    error::ApiError,
    indexer::IndexerError,
    models::{
        BalanceResponse, NextCursor, TransactionCountResponse, TransactionListResponse,
        WalletAddress,
    },
    providers::{AssetPrice, PriceQuote},
    ratelimit::{protected_rate_limit, public_rate_limit},
    state::AppState,
    storage::StoredTransaction,
};

pub mod account;
pub mod balance;
pub mod health;
pub mod prices;
pub mod transactions;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/balance", get(balance::get_balance))
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/count", get(transactions::transaction_count))
        .route("/prices", get(prices::get_prices))
        .route_layer(from_fn_with_state(state.clone(), public_rate_limit));

    let account_routes = Router::new()
        .route("/account/balance", get(account::account_balance))
        .route("/account/transactions", get(account::account_transactions))
        .route_layer(from_fn_with_state(state.clone(), protected_rate_limit));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", public_routes.merge(account_routes))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Query strings that fail to deserialize (e.g. a non-numeric `chain_id`).
pub(crate) fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

/// Translate orchestrator failures. Only the unsupported-chain case is shown
/// to the caller; everything else is logged and reported as `context`.
pub(crate) fn indexer_error(err: IndexerError, context: &'static str) -> ApiError {
    match err {
        IndexerError::UnsupportedChain(e) => e.into(),
        other => {
            tracing::error!(error = %other, "{context}");
            ApiError::internal(context)
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health,
        health::liveness,
        balance::get_balance,
        transactions::list_transactions,
        transactions::transaction_count,
        prices::get_prices,
        account::account_balance,
        account::account_transactions
    ),
    components(
        schemas(
            WalletAddress,
            TokenBalance,
            BalanceResponse,
            StoredTransaction,
            NextCursor,
            TransactionListResponse,
            TransactionCountResponse,
            AssetPrice,
            PriceQuote,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and health probes"),
        (name = "Portfolio", description = "Balances, transaction history and prices"),
        (name = "Account", description = "Portfolio endpoints for the authenticated wallet")
    )
)]
struct ApiDoc;
