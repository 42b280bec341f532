// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rate-limit middleware for Axum route groups.
//!
//! ```rust,ignore
//! let public = Router::new()
//!     .route("/v1/prices", get(prices::get_prices))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), public_rate_limit));
//! ```

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{RateLimitDecision, RateLimiter};
use crate::{error::ApiError, state::AppState};

/// Rate limit anonymous endpoints.
pub async fn public_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state.public_limiter, request, next).await
}

/// Rate limit authenticated endpoints.
pub async fn protected_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state.protected_limiter, request, next).await
}

async fn enforce(limiter: &RateLimiter, request: Request, next: Next) -> Response {
    let caller = caller_ip(request.headers());
    match limiter.check(&caller) {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Limited { retry_after_secs } => {
            tracing::warn!(
                caller = %caller,
                tier = limiter.policy().tier.as_str(),
                retry_after_secs,
                "Rate limit exceeded"
            );
            ApiError::too_many_requests(retry_after_secs).into_response()
        }
    }
}

/// Caller identity for rate limiting: `cf-connecting-ip`, else the first
/// `x-forwarded-for` hop, else `unknown`.
pub fn caller_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("cf-connecting-ip") {
        return ip.to_string();
    }

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(caller_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 198.51.100.2 , 10.0.0.1"),
        );
        assert_eq!(caller_ip(&headers), "198.51.100.2");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(caller_ip(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("  "));
        assert_eq!(caller_ip(&headers), "unknown");
    }
}
