// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access token inspection without verification.
//!
//! These helpers read a bearer token's claims locally so the client can
//! derive expiry and remaining lifetime with no server round-trip. They make
//! no trust decision: the signature is never checked here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims read from a token's payload segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    /// `sub` claim, stringified.
    pub subject: String,
    pub email: Option<String>,
    /// `iat`, epoch seconds.
    pub issued_at: u64,
    /// `exp`, epoch seconds.
    pub expires_at: u64,
    /// `rememberMe`, defaults false.
    pub remember_me: bool,
    /// All other claims, untyped.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode a token's claims. `None` for anything not shaped like a token:
/// wrong part count, bad base64, non-JSON payload, or missing/non-numeric
/// `exp`/`iat`.
pub fn decode(token: &str) -> Option<TokenPayload> {
    let mut parts = token.split('.');
    let payload_part = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(p), Some(_), None) => p,
        _ => return None,
    };

    // Tolerate padded input; the alphabet must still be URL-safe.
    let bytes = URL_SAFE_NO_PAD.decode(payload_part.trim_end_matches('=')).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let obj = value.as_object()?;

    let expires_at = claim_number(obj.get("exp")?)?;
    let issued_at = claim_number(obj.get("iat")?)?;

    let mut extra = obj.clone();
    for key in ["sub", "email", "iat", "exp", "rememberMe"] {
        extra.remove(key);
    }

    Some(TokenPayload {
        subject: obj.get("sub").map(claim_string).unwrap_or_default(),
        email: obj.get("email").and_then(|v| v.as_str()).map(str::to_owned),
        issued_at,
        expires_at,
        remember_me: obj.get("rememberMe").and_then(|v| v.as_bool()).unwrap_or(false),
        extra,
    })
}

/// Expiry instant in epoch milliseconds, or `None` for an invalid token.
/// A far-future `exp` that would overflow in milliseconds clamps to
/// `u64::MAX` rather than wrapping.
pub fn expiration_time_ms(token: &str) -> Option<u64> {
    Some(decode(token)?.expires_at.saturating_mul(1000))
}

/// Whether the token has expired. Exactly-at-expiry counts as expired.
pub fn is_expired(token: &str) -> Option<bool> {
    Some(epoch_ms() >= expiration_time_ms(token)?)
}

/// Milliseconds until expiry, clamped at zero.
pub fn time_remaining_ms(token: &str) -> Option<u64> {
    Some(expiration_time_ms(token)?.saturating_sub(epoch_ms()))
}

fn claim_number(v: &serde_json::Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)
}

fn claim_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Current time as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
