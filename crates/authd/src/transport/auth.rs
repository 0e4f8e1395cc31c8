// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AuthError;
use crate::state::AppState;
use crate::token::{AccessClaims, TokenError, TokenSigner};

/// Extract and verify the Bearer access token from HTTP headers.
pub fn verify_bearer(headers: &HeaderMap, signer: &TokenSigner) -> Result<AccessClaims, AuthError> {
    let header =
        headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(AuthError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(AuthError::Unauthorized)?;

    match signer.verify(token) {
        Ok(claims) => Ok(claims),
        // An expired access token is the reactive-renewal trigger for
        // clients; it still reads as plain 401 here.
        Err(TokenError::Expired) => Err(AuthError::Unauthorized),
        Err(_) => Err(AuthError::Unauthorized),
    }
}

/// Axum middleware that enforces access-token authentication.
///
/// Exempt: `/api/v1/health` and the `/api/v1/auth/{register,login,refresh}`
/// endpoints, which mint or rotate credentials rather than consume them.
pub async fn auth_layer(
    state: State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/api/v1/health"
        || path == "/api/v1/auth/register"
        || path == "/api/v1/auth/login"
        || path == "/api/v1/auth/refresh"
    {
        return next.run(req).await;
    }

    match verify_bearer(req.headers(), &state.signer) {
        Ok(claims) => {
            // Handlers read the caller's identity and session id from here.
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(code) => {
            let body = crate::error::ErrorResponse { error: code.to_error_body("unauthorized") };
            (
                StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::UNAUTHORIZED),
                axum::Json(body),
            )
                .into_response()
        }
    }
}
