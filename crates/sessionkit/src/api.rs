// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the authd HTTP API, behind a trait so renewal logic can be
//! exercised against a scriptable fake.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Access/refresh credential pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authenticated user as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserInfo,
    pub tokens: TokenPair,
}

/// One entry from the server's session list.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEntry {
    pub id: String,
    #[serde(default)]
    pub device_info: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub created_at_ms: u64,
    pub last_activity_at_ms: u64,
    /// Whether this entry backs the token used for the listing request.
    pub current: bool,
}

/// API failure, split the way renewal needs it: a rejected credential is
/// authoritative, a transport failure is retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The access token was not accepted (reactive-renewal trigger).
    Unauthorized,
    /// The refresh credential was refused: reused, rotated, or revoked.
    Rejected,
    /// Network-level failure; the credential state is unknown.
    Transport(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => f.write_str("unauthorized"),
            Self::Rejected => f.write_str("session rejected"),
            Self::Transport(e) => write!(f, "transport failure: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Boundary to the auth server. Futures are `Send` so renewal can run on
/// spawned tasks.
pub trait AuthApi: Send + Sync + 'static {
    fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> impl Future<Output = Result<AuthSession, ApiError>> + Send;

    fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        remember_me: bool,
    ) -> impl Future<Output = Result<AuthSession, ApiError>> + Send;

    /// Exchange the refresh credential for a new pair. Single-use: a second
    /// exchange of the same value must fail.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenPair, ApiError>> + Send;

    fn logout(&self, access_token: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn list_sessions(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<SessionEntry>, ApiError>> + Send;

    fn revoke_session(
        &self,
        access_token: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// HTTP implementation over reqwest.
pub struct HttpAuthApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AuthResponseBody {
    user: UserInfo,
    access_token: String,
    refresh_token: String,
}

impl HttpAuthApi {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client =
            reqwest::Client::builder().timeout(std::time::Duration::from_secs(10)).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_owned(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn auth_request(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !resp.status().is_success() {
            return Err(ApiError::Transport(format!("login failed ({})", resp.status())));
        }
        let body: AuthResponseBody =
            resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(AuthSession {
            user: body.user,
            tokens: TokenPair {
                access_token: body.access_token,
                refresh_token: body.refresh_token,
            },
        })
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthSession, ApiError> {
        self.auth_request(
            "/api/v1/auth/login",
            serde_json::json!({ "email": email, "password": password, "remember_me": remember_me }),
        )
        .await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        remember_me: bool,
    ) -> Result<AuthSession, ApiError> {
        self.auth_request(
            "/api/v1/auth/register",
            serde_json::json!({
                "email": email,
                "password": password,
                "name": name,
                "remember_me": remember_me,
            }),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/refresh"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        // 401 from the refresh endpoint is the authoritative rejection.
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Rejected);
        }
        if !resp.status().is_success() {
            return Err(ApiError::Transport(format!("refresh failed ({})", resp.status())));
        }
        resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn logout(&self, access_token: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/logout"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        check_authed(resp).await.map(|_| ())
    }

    async fn list_sessions(&self, access_token: &str) -> Result<Vec<SessionEntry>, ApiError> {
        let resp = self
            .client
            .get(self.url("/api/v1/sessions"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let resp = check_authed(resp).await?;
        resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn revoke_session(&self, access_token: &str, session_id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/v1/sessions/{session_id}")))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        check_authed(resp).await.map(|_| ())
    }
}

async fn check_authed(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !resp.status().is_success() {
        return Err(ApiError::Transport(format!("request failed ({})", resp.status())));
    }
    Ok(resp)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
