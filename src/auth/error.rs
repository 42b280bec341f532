// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is not base64-encoded JSON
    MalformedToken,
    /// Token lacks address, signature, message or timestamp
    MissingFields,
    /// Token timestamp is older than the allowed age
    TokenExpired,
    /// Token timestamp is in the future
    TokenNotYetValid,
    /// Signature is not `0x` followed by 130 hex characters
    InvalidSignature,
    /// Token address is not a valid wallet address
    InvalidAddress,
    /// Requested address does not belong to the token holder
    AddressMismatch,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::MissingFields => "missing_fields",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidAddress => "invalid_address",
            AuthError::AddressMismatch => "address_mismatch",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AddressMismatch => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => {
                write!(f, "Missing or invalid authorization header")
            }
            AuthError::MalformedToken => write!(f, "Authentication failed"),
            AuthError::MissingFields => write!(f, "Invalid authentication data"),
            AuthError::TokenExpired => write!(f, "Authentication token expired"),
            AuthError::TokenNotYetValid => write!(f, "Authentication token is not yet valid"),
            AuthError::InvalidSignature => write!(f, "Invalid signature"),
            AuthError::InvalidAddress => write!(f, "Invalid address in authentication token"),
            AuthError::AddressMismatch => {
                write!(f, "You can only access data for your own address")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn address_mismatch_returns_403() {
        let response = AuthError::AddressMismatch.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "You can only access data for your own address");
    }

    #[test]
    fn token_errors_are_unauthorized() {
        for err in [
            AuthError::MalformedToken,
            AuthError::MissingFields,
            AuthError::TokenExpired,
            AuthError::InvalidSignature,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
