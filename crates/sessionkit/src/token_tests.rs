// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use proptest::prelude::*;

use super::*;
use crate::test_support::{make_token, make_token_at};

fn token_with_payload(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    format!("{header}.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

#[test]
fn decodes_well_formed_token() {
    let token = make_token_at(2_000_000_000, true);
    let payload = decode(&token).unwrap();
    assert_eq!(payload.subject, "user-1");
    assert_eq!(payload.email.as_deref(), Some("a@example.com"));
    assert_eq!(payload.expires_at, 2_000_000_000);
    assert!(payload.remember_me);
    assert!(payload.issued_at > 0);
}

#[test]
fn unknown_claims_pass_through_untyped() {
    let token = token_with_payload(r#"{"sub":"u","iat":1,"exp":2,"role":"admin","n":7}"#);
    let payload = decode(&token).unwrap();
    assert_eq!(payload.extra.get("role").and_then(|v| v.as_str()), Some("admin"));
    assert_eq!(payload.extra.get("n").and_then(|v| v.as_u64()), Some(7));
    assert!(!payload.extra.contains_key("exp"));
}

#[test]
fn remember_me_defaults_false() {
    let token = token_with_payload(r#"{"sub":"u","iat":1,"exp":2}"#);
    assert!(!decode(&token).unwrap().remember_me);
}

#[test]
fn tolerates_base64_padding() {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
    let mut payload = URL_SAFE_NO_PAD.encode(r#"{"iat":1,"exp":2}"#);
    while payload.len() % 4 != 0 {
        payload.push('=');
    }
    let token = format!("{header}.{payload}.sig");
    assert!(decode(&token).is_some());
}

#[yare::parameterized(
    empty          = { "" },
    two_parts      = { "aaa.bbb" },
    four_parts     = { "a.b.c.d" },
    bad_base64     = { "head.!!not-base64!!.sig" },
    not_json       = { "aGVhZA.aGVhZA.c2ln" },
    json_array     = { "head.WzFd.sig" },
    missing_exp    = { &token_with_payload(r#"{"sub":"u","iat":1}"#) },
    missing_iat    = { &token_with_payload(r#"{"sub":"u","exp":2}"#) },
    exp_not_number = { &token_with_payload(r#"{"iat":1,"exp":"soon"}"#) },
    iat_not_number = { &token_with_payload(r#"{"iat":null,"exp":2}"#) },
)]
fn invalid_tokens_decode_to_none(token: &str) {
    assert_eq!(decode(token), None);
    assert_eq!(expiration_time_ms(token), None);
    assert_eq!(is_expired(token), None);
    assert_eq!(time_remaining_ms(token), None);
}

#[test]
fn huge_exp_clamps_instead_of_overflowing() {
    // Numeric but absurd exp values are still "valid" per decode; the
    // millisecond conversion must clamp, not wrap.
    let token = token_with_payload(&format!(r#"{{"iat":1,"exp":{}}}"#, u64::MAX));
    assert!(decode(&token).is_some());
    assert_eq!(expiration_time_ms(&token), Some(u64::MAX));
    assert_eq!(is_expired(&token), Some(false));
    assert!(time_remaining_ms(&token).is_some());
}

#[test]
fn float_exp_beyond_u64_saturates() {
    let token = token_with_payload(r#"{"iat":1,"exp":1e30}"#);
    let payload = decode(&token).unwrap();
    assert_eq!(payload.expires_at, u64::MAX);
    assert_eq!(expiration_time_ms(&token), Some(u64::MAX));
}

#[test]
fn expiration_time_is_exp_in_millis() {
    let token = make_token_at(1_900_000_000, false);
    assert_eq!(expiration_time_ms(&token), Some(1_900_000_000_000));
}

#[test]
fn future_token_not_expired_and_has_remaining_time() {
    let token = make_token(std::time::Duration::from_secs(600), false);
    assert_eq!(is_expired(&token), Some(false));
    let remaining = time_remaining_ms(&token).unwrap();
    assert!(remaining > 590_000 && remaining <= 600_000, "remaining={remaining}");
}

#[test]
fn past_token_expired_with_zero_remaining() {
    let token = make_token_at(epoch_ms() / 1000 - 60, false);
    assert_eq!(is_expired(&token), Some(true));
    assert_eq!(time_remaining_ms(&token), Some(0));
}

#[test]
fn exactly_at_expiry_counts_as_expired() {
    // exp at the current second; epoch_ms() >= exp*1000 once the second has
    // started, so this is already past the boundary.
    let token = make_token_at(epoch_ms() / 1000, false);
    assert_eq!(is_expired(&token), Some(true));
}

#[test]
fn remaining_time_never_increases() {
    let token = make_token(std::time::Duration::from_secs(600), false);
    let first = time_remaining_ms(&token).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(15));
    let second = time_remaining_ms(&token).unwrap();
    assert!(second <= first, "{second} > {first}");
}

proptest! {
    #[test]
    fn decode_never_panics(s in "\\PC*") {
        let _ = decode(&s);
        let _ = is_expired(&s);
        let _ = time_remaining_ms(&s);
    }

    #[test]
    fn arbitrary_three_part_strings_never_panic(a in "[a-zA-Z0-9_-]{0,40}", b in "\\PC{0,60}", c in "[a-zA-Z0-9_-]{0,40}") {
        let _ = decode(&format!("{a}.{b}.{c}"));
    }

    #[test]
    fn any_numeric_exp_never_panics(exp in any::<u64>(), iat in any::<u64>()) {
        let token = token_with_payload(&format!(r#"{{"iat":{iat},"exp":{exp}}}"#));
        let _ = decode(&token);
        let _ = expiration_time_ms(&token);
        let _ = is_expired(&token);
        let _ = time_remaining_ms(&token);
    }
}
