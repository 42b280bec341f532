// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated wallets.
//!
//! Use the `WalletAuth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(WalletAuth(wallet): WalletAuth) -> impl IntoResponse {
//!     // wallet is AuthenticatedWallet
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use super::{token::verify_token, AuthError, AuthenticatedWallet};

/// Extractor for authenticated wallets.
///
/// Validates the bearer token from the Authorization header. The result is
/// cached in request extensions so a second extraction is free.
pub struct WalletAuth(pub AuthenticatedWallet);

impl<S: Send + Sync> FromRequestParts<S> for WalletAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(wallet) = parts.extensions.get::<AuthenticatedWallet>().cloned() {
            return Ok(WalletAuth(wallet));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let wallet = verify_token(token, Utc::now()).inspect_err(|e| {
            tracing::debug!(error_code = e.error_code(), "Rejected bearer token");
        })?;

        tracing::debug!(
            address = %wallet.address,
            issued_at = %wallet.issued_at,
            "Authenticated wallet"
        );
        parts.extensions.insert(wallet.clone());
        Ok(WalletAuth(wallet))
    }
}
