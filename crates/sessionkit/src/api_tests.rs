// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_builds_a_client_with_a_request_timeout() {
    let api = HttpAuthApi::new("http://localhost:9000".to_owned())
        .unwrap_or_else(|e| panic!("client construction failed: {e}"));
    assert_eq!(api.url("/api/v1/auth/login"), "http://localhost:9000/api/v1/auth/login");
}

#[test]
fn new_trims_trailing_slashes_from_the_base_url() {
    let api = HttpAuthApi::new("http://localhost:9000/".to_owned())
        .unwrap_or_else(|e| panic!("client construction failed: {e}"));
    assert_eq!(api.url("/api/v1/sessions"), "http://localhost:9000/api/v1/sessions");
}
