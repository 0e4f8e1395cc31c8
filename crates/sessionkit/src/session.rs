// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle facade: the one object the rest of the application
//! talks to for login/logout, the current credentials, renewal triggers,
//! and the session-expired signal.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::{ApiError, AuthApi, SessionEntry, TokenPair, UserInfo};
use crate::persist::{self, CredentialCell, Credentials};
use crate::renew::{RenewCoordinator, RenewError};
use crate::scheduler::RefreshScheduler;

type ExpiredCallback = Box<dyn Fn() + Send + Sync>;

/// Owns the authenticated user, the credential cell, the scheduler, and the
/// renewal coordinator. Construct once per process, inside a tokio runtime.
pub struct SessionManager<A: AuthApi> {
    api: Arc<A>,
    scheduler: RefreshScheduler,
    coordinator: RenewCoordinator<A>,
    creds: Arc<CredentialCell>,
    user: Mutex<Option<UserInfo>>,
    expired_notified: AtomicBool,
    on_expired: Mutex<Option<ExpiredCallback>>,
    store_path: Option<PathBuf>,
}

impl<A: AuthApi> SessionManager<A> {
    /// Create the facade. If `store_path` holds previously saved
    /// credentials, they are restored and the scheduler re-armed so renewal
    /// continues across restarts.
    pub fn new(api: Arc<A>, store_path: Option<PathBuf>) -> Arc<Self> {
        Self::with_scheduler(api, store_path, RefreshScheduler::new())
    }

    /// As [`new`](Self::new) but with an injected scheduler (tests compress
    /// its buffer).
    pub fn with_scheduler(
        api: Arc<A>,
        store_path: Option<PathBuf>,
        scheduler: RefreshScheduler,
    ) -> Arc<Self> {
        let creds = Arc::new(CredentialCell::default());
        let coordinator = RenewCoordinator::new(Arc::clone(&api), Arc::clone(&creds));
        let mgr = Arc::new(Self {
            api,
            scheduler,
            coordinator,
            creds,
            user: Mutex::new(None),
            expired_notified: AtomicBool::new(false),
            on_expired: Mutex::new(None),
            store_path,
        });

        if let Some(ref path) = mgr.store_path {
            if path.exists() {
                match persist::load(path) {
                    Ok(saved) => {
                        mgr.creds.set(saved);
                        mgr.arm_from_current();
                        tracing::info!("restored persisted credentials, renewal re-armed");
                    }
                    Err(e) => {
                        tracing::warn!(err = %e, "failed to load persisted credentials");
                    }
                }
            }
        }
        mgr
    }

    // -- Authentication -------------------------------------------------------

    pub async fn login(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<UserInfo, ApiError> {
        let session = self.api.login(email, password, remember_me).await?;
        self.install_session(session.user.clone(), &session.tokens, remember_me);
        Ok(session.user)
    }

    pub async fn register(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        name: Option<&str>,
        remember_me: bool,
    ) -> Result<UserInfo, ApiError> {
        let session = self.api.register(email, password, name, remember_me).await?;
        self.install_session(session.user.clone(), &session.tokens, remember_me);
        Ok(session.user)
    }

    /// Revoke the current session server-side and clear all local state.
    pub async fn logout(&self) {
        if let Some(token) = self.creds.access_token() {
            if let Err(e) = self.api.logout(&token).await {
                tracing::warn!(err = %e, "server-side logout failed, clearing locally anyway");
            }
        }
        self.clear_local();
    }

    fn install_session(self: &Arc<Self>, user: UserInfo, tokens: &TokenPair, remember_me: bool) {
        // A fresh login opens a new expiry episode.
        self.expired_notified.store(false, Ordering::SeqCst);
        self.creds.set(Credentials {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            remember_me,
        });
        *self.user.lock() = Some(user);
        self.persist_current();
        self.arm_from_current();
    }

    // -- Renewal triggers -----------------------------------------------------

    /// Reactive renewal: call when any authenticated request came back
    /// unauthorized. Shares the in-flight rotation with the proactive timer.
    pub async fn handle_unauthorized(self: &Arc<Self>) -> Result<TokenPair, RenewError> {
        self.renew_now().await
    }

    /// Explicit renewal, e.g. the expiry notice's "extend now" action.
    pub async fn extend_session(self: &Arc<Self>) -> Result<TokenPair, RenewError> {
        self.renew_now().await
    }

    async fn renew_now(self: &Arc<Self>) -> Result<TokenPair, RenewError> {
        match self.coordinator.renew().await {
            Ok(pair) => {
                self.persist_current();
                self.arm_from_current();
                Ok(pair)
            }
            Err(RenewError::Rejected) => {
                self.session_expired();
                Err(RenewError::Rejected)
            }
            // Transport exhaustion leaves credentials in place; the next
            // proactive or reactive trigger tries again.
            Err(e) => Err(e),
        }
    }

    /// Arm the proactive timer from the currently held access token.
    fn arm_from_current(self: &Arc<Self>) {
        let Some(token) = self.creds.access_token() else {
            return;
        };
        let me = Arc::clone(self);
        self.scheduler.start(
            &token,
            Box::new(move || {
                Box::pin(async move {
                    me.renew_now().await.map(|_| ()).map_err(anyhow::Error::from)
                })
            }),
        );
    }

    // -- Expiry signal --------------------------------------------------------

    /// Register the session-expired callback. Invoked exactly once per
    /// expiry episode; the latch resets on the next login.
    pub fn on_session_expired(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_expired.lock() = Some(Box::new(callback));
    }

    fn session_expired(&self) {
        if self.expired_notified.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("session expired, clearing credentials");
        self.clear_local_keep_latch();
        if let Some(cb) = self.on_expired.lock().as_ref() {
            cb();
        }
    }

    fn clear_local(&self) {
        self.clear_local_keep_latch();
        self.expired_notified.store(false, Ordering::SeqCst);
    }

    fn clear_local_keep_latch(&self) {
        self.scheduler.clear();
        self.creds.clear();
        *self.user.lock() = None;
        if let Some(ref path) = self.store_path {
            persist::remove(path);
        }
    }

    fn persist_current(&self) {
        let (Some(path), Some(creds)) = (self.store_path.as_ref(), self.creds.snapshot()) else {
            return;
        };
        if let Err(e) = persist::save(path, &creds) {
            tracing::warn!(err = %e, "failed to persist credentials");
        }
    }

    // -- Read-only accessors --------------------------------------------------

    pub fn access_token(&self) -> Option<String> {
        self.creds.access_token()
    }

    pub fn remember_me(&self) -> bool {
        self.creds.remember_me()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.user.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.creds.is_set()
    }

    pub fn is_session_expired(&self) -> bool {
        self.expired_notified.load(Ordering::SeqCst)
    }

    pub fn is_renewal_scheduled(&self) -> bool {
        self.scheduler.is_running()
    }

    // -- Session management passthrough ---------------------------------------

    pub async fn list_sessions(&self) -> Result<Vec<SessionEntry>, ApiError> {
        let token = self.creds.access_token().ok_or(ApiError::Unauthorized)?;
        self.api.list_sessions(&token).await
    }

    pub async fn revoke_session(&self, session_id: &str) -> Result<(), ApiError> {
        let token = self.creds.access_token().ok_or(ApiError::Unauthorized)?;
        self.api.revoke_session(&token, session_id).await
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
