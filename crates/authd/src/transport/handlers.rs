// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for login, token rotation, and session management.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::state::AppState;
use crate::token::{epoch_secs, generate_refresh_token, AccessClaims};
use crate::users::User;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub created_at_ms: u64,
    pub last_activity_at_ms: u64,
    /// Derived per call: whether this is the session backing the request.
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub id: String,
    pub removed: bool,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let session_count = s.registry.count().await;
    Json(HealthResponse { status: "running".to_owned(), session_count })
}

/// `POST /api/v1/auth/register` — create an account and open a session.
pub async fn register(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return AuthError::BadRequest
            .to_http_response("email and password are required")
            .into_response();
    }
    let Some(user) = s.users.create(&req.email, &req.password, req.name.clone()).await else {
        return AuthError::EmailTaken.to_http_response("email already registered").into_response();
    };
    open_session(&s, user, req.remember_me, &headers).await.into_response()
}

/// `POST /api/v1/auth/login` — verify credentials and open a session.
pub async fn login(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let Some(user) = s.users.verify(&req.email, &req.password).await else {
        return AuthError::Unauthorized
            .to_http_response("invalid email or password")
            .into_response();
    };
    open_session(&s, user, req.remember_me, &headers).await.into_response()
}

/// Mint a token pair and register the session record for a fresh login.
async fn open_session(
    s: &Arc<AppState>,
    user: User,
    remember_me: bool,
    headers: &HeaderMap,
) -> axum::response::Response {
    let refresh_token = generate_refresh_token();
    let session = s
        .registry
        .create(
            &user.id,
            &refresh_token,
            device_info(headers),
            client_ip(headers),
            remember_me,
            s.config.refresh_ttl(remember_me),
        )
        .await;

    let claims = AccessClaims {
        sub: user.id.clone(),
        sid: session.id,
        email: Some(user.email.clone()),
        iat: epoch_secs(),
        exp: epoch_secs() + s.config.access_ttl_secs,
        remember_me,
    };
    match s.signer.mint(&claims) {
        Ok(access_token) => {
            tracing::info!(user = %user.id, "session opened");
            Json(AuthResponse { user, access_token, refresh_token }).into_response()
        }
        Err(e) => {
            tracing::warn!(err = %e, "failed to mint access token");
            AuthError::Internal.to_http_response("token minting failed").into_response()
        }
    }
}

/// `POST /api/v1/auth/refresh` — rotate the refresh token, mint a new pair.
///
/// A rejected rotation is the authoritative end-of-session signal: the token
/// was wrong, already used, or its session was revoked or expired.
pub async fn refresh(
    State(s): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> impl IntoResponse {
    let next = generate_refresh_token();
    let session = match s.registry.rotate(&req.refresh_token, &next).await {
        Ok(session) => session,
        Err(_) => {
            tracing::info!("refresh rejected");
            return AuthError::SessionExpired
                .to_http_response("refresh token is no longer valid")
                .into_response();
        }
    };

    // The user store is in-memory; after a daemon restart the email claim may
    // be unavailable even though the persisted session is still good.
    let email = s.users.get(&session.user_id).await.map(|u| u.email);
    let claims = AccessClaims {
        sub: session.user_id.clone(),
        sid: session.id,
        email,
        iat: epoch_secs(),
        exp: epoch_secs() + s.config.access_ttl_secs,
        remember_me: session.remember_me,
    };
    match s.signer.mint(&claims) {
        Ok(access_token) => {
            Json(RefreshResponse { access_token, refresh_token: next }).into_response()
        }
        Err(e) => {
            tracing::warn!(err = %e, "failed to mint access token");
            AuthError::Internal.to_http_response("token minting failed").into_response()
        }
    }
}

/// `POST /api/v1/auth/logout` — revoke the caller's current session.
pub async fn logout(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
) -> impl IntoResponse {
    let revoked = s.registry.revoke(&claims.sid).await;
    tracing::info!(user = %claims.sub, session = %claims.sid, revoked, "logout");
    Json(LogoutResponse { revoked })
}

/// `GET /api/v1/sessions` — the caller's sessions, most recent first.
pub async fn list_sessions(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
) -> impl IntoResponse {
    let sessions = s.registry.list(&claims.sub).await;
    let infos: Vec<SessionInfo> = sessions
        .into_iter()
        .map(|sess| SessionInfo {
            current: sess.id == claims.sid,
            id: sess.id,
            device_info: sess.device_info,
            ip_address: sess.ip_address,
            created_at_ms: sess.created_at_ms,
            last_activity_at_ms: sess.last_activity_at_ms,
        })
        .collect();
    Json(infos)
}

/// `DELETE /api/v1/sessions/{id}` — revoke one of the caller's sessions.
///
/// Revoking the current session is allowed here; forbidding it is a UI
/// policy, not a registry invariant.
pub async fn revoke_session(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = s.registry.get(&id).await else {
        return AuthError::SessionNotFound.to_http_response("no such session").into_response();
    };
    if session.user_id != claims.sub {
        return AuthError::Forbidden
            .to_http_response("session belongs to another user")
            .into_response();
    }
    let removed = s.registry.revoke(&id).await;
    tracing::info!(user = %claims.sub, session = %id, "session revoked");
    Json(RevokeResponse { id, removed }).into_response()
}

fn device_info(headers: &HeaderMap) -> Option<String> {
    headers.get("user-agent").and_then(|v| v.to_str().ok()).map(str::to_owned)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
}
