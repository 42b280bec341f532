// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{auth::AuthError, blockchain::UnsupportedChain};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Machine-readable code (authentication failures only).
    pub error_code: Option<&'static str>,
    /// Seconds until the caller may retry (rate limiting only).
    pub retry_after: Option<u64>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Generic failure. The message is what the caller sees, so keep upstream
    /// details in the logs rather than here.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unsupported_chain(chain_id: u64, supported: &[u64]) -> Self {
        let list = supported
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::bad_request(format!(
            "Unsupported chain ID: {chain_id}. Supported chains: {list}"
        ))
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: format!(
                "Rate limit exceeded. Try again in {retry_after_secs} seconds."
            ),
            error_code: None,
            retry_after: Some(retry_after_secs),
        }
    }
}

impl From<UnsupportedChain> for ApiError {
    fn from(err: UnsupportedChain) -> Self {
        Self::unsupported_chain(err.chain_id, &err.supported)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
            error_code: Some(err.error_code()),
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let internal = ApiError::internal("oops");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(internal.retry_after.is_none());
    }

    #[test]
    fn unsupported_chain_lists_supported_ids() {
        let err = ApiError::unsupported_chain(1, &[11155111, 421614]);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Unsupported chain ID: 1. Supported chains: 11155111, 421614"
        );
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[tokio::test]
    async fn too_many_requests_sets_retry_after_header() {
        let response = ApiError::too_many_requests(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "42");

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Rate limit exceeded. Try again in 42 seconds.");
    }

    #[tokio::test]
    async fn auth_errors_keep_their_code() {
        let err = ApiError::from(AuthError::AddressMismatch);
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "address_mismatch");
        assert_eq!(body["error"], "You can only access data for your own address");
    }

    #[test]
    fn unsupported_chain_converts_to_bad_request() {
        let err = ApiError::from(UnsupportedChain {
            chain_id: 5,
            supported: vec![11155111],
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Unsupported chain ID: 5. Supported chains: 11155111");
    }
}
