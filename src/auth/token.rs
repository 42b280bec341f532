// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet bearer tokens.
//!
//! A token is standard base64 over a JSON object:
//!
//! ```json
//! {"address": "0x…", "signature": "0x…", "message": "…", "timestamp": 1700000000000}
//! ```
//!
//! `timestamp` is either unix milliseconds or an RFC 3339 string. Only the
//! signature *format* is checked; it is not recovered against the message.

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::AuthError;
use crate::models::is_valid_address;

/// Oldest token accepted, in milliseconds.
pub const MAX_TOKEN_AGE_MS: i64 = 5 * 60 * 1000;

/// Tolerated clock skew for tokens stamped in the future, in milliseconds.
pub const CLOCK_SKEW_LEEWAY_MS: i64 = 60 * 1000;

/// Caller identity established from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWallet {
    pub address: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthenticatedWallet {
    /// Require that `address` is the authenticated one (ignoring case).
    pub fn ensure_owns(&self, address: &str) -> Result<(), AuthError> {
        if self.address.eq_ignore_ascii_case(address) {
            Ok(())
        } else {
            Err(AuthError::AddressMismatch)
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Decode and check a bearer token at time `now`.
pub fn verify_token(token: &str, now: DateTime<Utc>) -> Result<AuthenticatedWallet, AuthError> {
    let bytes = Base64::decode_vec(token).map_err(|_| AuthError::MalformedToken)?;
    let payload: TokenPayload =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(address), Some(signature), Some(_message), Some(timestamp)) = (
        present(payload.address),
        present(payload.signature),
        present(payload.message),
        payload.timestamp.filter(is_set),
    ) else {
        return Err(AuthError::MissingFields);
    };

    let issued_at = parse_timestamp(&timestamp).ok_or(AuthError::MalformedToken)?;
    let age_ms = (now - issued_at).num_milliseconds();
    if age_ms > MAX_TOKEN_AGE_MS {
        return Err(AuthError::TokenExpired);
    }
    if -age_ms > CLOCK_SKEW_LEEWAY_MS {
        return Err(AuthError::TokenNotYetValid);
    }

    if !is_signature_format(&signature) {
        return Err(AuthError::InvalidSignature);
    }
    if !is_valid_address(&address) {
        return Err(AuthError::InvalidAddress);
    }

    Ok(AuthenticatedWallet { address, issued_at })
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        _ => None,
    }
}

/// `0x` followed by 130 hex characters (65-byte r‖s‖v signature).
fn is_signature_format(signature: &str) -> bool {
    signature.len() == 132
        && signature.starts_with("0x")
        && signature[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
