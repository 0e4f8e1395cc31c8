// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: token builders and a scriptable auth API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;

use crate::api::{ApiError, AuthApi, AuthSession, SessionEntry, TokenPair, UserInfo};
use crate::token::epoch_ms;

/// Build an unsigned-but-well-formed token expiring `expires_in` from now.
pub fn make_token(expires_in: Duration, remember_me: bool) -> String {
    make_token_at(epoch_ms() / 1000 + expires_in.as_secs(), remember_me)
}

/// Build a token with an explicit `exp` (epoch seconds).
pub fn make_token_at(exp: u64, remember_me: bool) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "sub": "user-1",
        "email": "a@example.com",
        "iat": epoch_ms() / 1000,
        "exp": exp,
        "rememberMe": remember_me,
    });
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.sig")
}

/// What the mock's `refresh` should do next.
#[derive(Debug, Clone)]
pub enum RefreshScript {
    /// Succeed after the given pause (simulates network latency).
    Succeed { delay: Duration, expires_in: Duration },
    /// Reject the rotation (token reused or session revoked).
    Reject,
    /// Fail with a transport error `failures` times, then succeed.
    FlakyThenSucceed { failures: u32, expires_in: Duration },
}

/// Scriptable [`AuthApi`] that counts rotation calls.
pub struct MockApi {
    pub refresh_calls: AtomicU32,
    pub logout_calls: AtomicU32,
    pub revoke_calls: Mutex<Vec<String>>,
    script: Mutex<RefreshScript>,
    transport_failures_left: AtomicU32,
}

impl MockApi {
    pub fn new(script: RefreshScript) -> Self {
        let failures = match &script {
            RefreshScript::FlakyThenSucceed { failures, .. } => *failures,
            _ => 0,
        };
        Self {
            refresh_calls: AtomicU32::new(0),
            logout_calls: AtomicU32::new(0),
            revoke_calls: Mutex::new(Vec::new()),
            script: Mutex::new(script),
            transport_failures_left: AtomicU32::new(failures),
        }
    }

    pub fn set_script(&self, script: RefreshScript) {
        if let RefreshScript::FlakyThenSucceed { failures, .. } = &script {
            self.transport_failures_left.store(*failures, Ordering::SeqCst);
        }
        *self.script.lock() = script;
    }

    pub fn refresh_call_count(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn fresh_pair(&self, expires_in: Duration) -> TokenPair {
        let n = self.refresh_calls.load(Ordering::SeqCst);
        // Stagger expiry so every minted token is textually distinct.
        TokenPair {
            access_token: make_token(expires_in + Duration::from_secs(n.into()), false),
            refresh_token: format!("refresh-{n}"),
        }
    }
}

impl AuthApi for MockApi {
    async fn login(
        &self,
        email: &str,
        _password: &str,
        remember_me: bool,
    ) -> Result<AuthSession, ApiError> {
        Ok(AuthSession {
            user: UserInfo { id: "user-1".into(), email: email.into(), name: None },
            tokens: TokenPair {
                access_token: make_token(Duration::from_secs(900), remember_me),
                refresh_token: "refresh-0".into(),
            },
        })
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        _name: Option<&str>,
        remember_me: bool,
    ) -> Result<AuthSession, ApiError> {
        self.login(email, password, remember_me).await
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().clone();
        match script {
            RefreshScript::Succeed { delay, expires_in } => {
                tokio::time::sleep(delay).await;
                Ok(self.fresh_pair(expires_in))
            }
            RefreshScript::Reject => {
                // Yield so concurrent callers overlap with this rotation.
                tokio::task::yield_now().await;
                Err(ApiError::Rejected)
            }
            RefreshScript::FlakyThenSucceed { expires_in, .. } => {
                let left = self.transport_failures_left.load(Ordering::SeqCst);
                if left > 0 {
                    self.transport_failures_left.store(left - 1, Ordering::SeqCst);
                    Err(ApiError::Transport("connection reset".into()))
                } else {
                    Ok(self.fresh_pair(expires_in))
                }
            }
        }
    }

    async fn logout(&self, _access_token: &str) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_sessions(&self, _access_token: &str) -> Result<Vec<SessionEntry>, ApiError> {
        Ok(vec![])
    }

    async fn revoke_session(&self, _access_token: &str, id: &str) -> Result<(), ApiError> {
        self.revoke_calls.lock().push(id.to_owned());
        Ok(())
    }
}
