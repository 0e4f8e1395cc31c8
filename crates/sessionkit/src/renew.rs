// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight renewal: the proactive timer and reactive 401 paths share
//! one rotation request, because a refresh token is valid for exactly one
//! exchange — a duplicate request would turn the loser into a replay.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use crate::api::{ApiError, AuthApi, TokenPair};
use crate::persist::CredentialCell;

/// Renewal outcome for error paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewError {
    /// The refresh token was refused: rotated elsewhere, reused, or its
    /// session revoked. The session is over; never retried.
    Rejected,
    /// Network failure after retries; credentials unchanged, a later
    /// trigger may succeed.
    Transport(String),
}

impl fmt::Display for RenewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => f.write_str("session expired"),
            Self::Transport(e) => write!(f, "renewal transport failure: {e}"),
        }
    }
}

impl std::error::Error for RenewError {}

struct Inner<A> {
    api: Arc<A>,
    creds: Arc<CredentialCell>,
    in_flight: Mutex<Option<broadcast::Sender<Result<TokenPair, RenewError>>>>,
}

/// Deduplicates concurrent renewal attempts into one rotation request.
pub struct RenewCoordinator<A: AuthApi> {
    inner: Arc<Inner<A>>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl<A: AuthApi> RenewCoordinator<A> {
    pub fn new(api: Arc<A>, creds: Arc<CredentialCell>) -> Self {
        Self {
            inner: Arc::new(Inner { api, creds, in_flight: Mutex::new(None) }),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }

    /// Override the transport-failure retry policy (tests compress it).
    pub fn with_retry(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    /// Rotate the refresh token and return the new pair.
    ///
    /// If a renewal is already in flight, await its outcome instead of
    /// issuing a second rotation. The rotation itself runs on a spawned
    /// task, so a caller dropped mid-await (timeout, `select!`) cannot
    /// strand the in-flight slot — the task always completes, publishes,
    /// and clears it. On success the credential cell holds the new pair
    /// before any caller observes the result.
    pub async fn renew(&self) -> Result<TokenPair, RenewError> {
        // Join an in-flight renewal, or start one. Subscribing under the
        // lock guarantees the rotation task's send cannot be missed.
        let mut rx = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    *slot = Some(tx);

                    let inner = Arc::clone(&self.inner);
                    let max_retries = self.max_retries;
                    let initial_backoff = self.initial_backoff;
                    tokio::spawn(async move {
                        let result = inner.rotate_with_retries(max_retries, initial_backoff).await;
                        let mut slot = inner.in_flight.lock().await;
                        if let Some(tx) = slot.take() {
                            let _ = tx.send(result);
                        }
                    });
                    rx
                }
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(RenewError::Transport("renewal abandoned".to_owned())),
        }
    }
}

impl<A: AuthApi> Inner<A> {
    /// One rotation with exponential backoff on transport failures only.
    /// Rejection is authoritative and returns at once.
    async fn rotate_with_retries(
        &self,
        max_retries: u32,
        initial_backoff: Duration,
    ) -> Result<TokenPair, RenewError> {
        let Some(refresh_token) = self.creds.refresh_token() else {
            return Err(RenewError::Rejected);
        };

        let mut backoff = initial_backoff;
        let max_backoff = Duration::from_secs(60);
        let mut attempt = 0u32;
        loop {
            match self.api.refresh(&refresh_token).await {
                Ok(pair) => {
                    self.creds.replace_tokens(&pair);
                    return Ok(pair);
                }
                Err(ApiError::Rejected) | Err(ApiError::Unauthorized) => {
                    return Err(RenewError::Rejected);
                }
                Err(ApiError::Transport(e)) => {
                    if attempt == max_retries {
                        return Err(RenewError::Transport(e));
                    }
                    tracing::debug!(attempt, err = %e, "renewal attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "renew_tests.rs"]
mod tests;
