// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proactive renewal scheduling: one cancellable timer armed a fixed lead
//! time before the access token expires.
//!
//! An instance enforces "at most one outstanding schedule": `start`
//! supersedes any prior timer, and cancellation is real — a cancelled
//! timer's task exits without invoking the callback, it is not merely
//! flagged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::token;

/// Lead time before expiry at which renewal runs.
pub const RENEWAL_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Boxed renewal callback. Errors are caught and logged by the scheduler.
pub type RenewFn =
    Box<dyn FnOnce() -> futures_util::future::BoxFuture<'static, anyhow::Result<()>> + Send>;

struct Scheduled {
    cancel: CancellationToken,
    generation: u64,
}

struct Inner {
    slot: Mutex<Option<Scheduled>>,
    generation: AtomicU64,
}

/// One-shot renewal timer. Owned by the session facade; must be used from
/// within a tokio runtime.
pub struct RefreshScheduler {
    inner: Arc<Inner>,
    buffer: Duration,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::with_buffer(RENEWAL_BUFFER)
    }

    /// Construct with a custom lead time (tests compress it).
    pub fn with_buffer(buffer: Duration) -> Self {
        Self {
            inner: Arc::new(Inner { slot: Mutex::new(None), generation: AtomicU64::new(0) }),
            buffer,
        }
    }

    /// Arm renewal for `token`, superseding any prior schedule.
    ///
    /// A token that cannot be decoded is logged and ignored. A token already
    /// inside the buffer window (or expired) renews immediately, still
    /// asynchronously.
    pub fn start(&self, token: &str, on_renew: RenewFn) {
        self.clear();

        let Some(remaining_ms) = token::time_remaining_ms(token) else {
            tracing::warn!("not scheduling renewal: token is not decodable");
            return;
        };
        let delay = Duration::from_millis(remaining_ms).saturating_sub(self.buffer);

        let cancel = CancellationToken::new();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.slot.lock() = Some(Scheduled { cancel: cancel.clone(), generation });

        if delay.is_zero() {
            tracing::debug!("token inside renewal buffer, renewing now");
        } else {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "renewal scheduled");
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return;
            }
            if let Err(e) = on_renew().await {
                tracing::warn!(err = %e, "scheduled renewal failed");
            }
            // Release the slot, but never a newer schedule's.
            let mut slot = inner.slot.lock();
            if slot.as_ref().is_some_and(|s| s.generation == generation) {
                *slot = None;
            }
        });
    }

    /// Cancel any outstanding schedule. Idempotent.
    pub fn clear(&self) {
        if let Some(s) = self.inner.slot.lock().take() {
            s.cancel.cancel();
        }
    }

    /// True while a timer is armed or its callback is executing.
    pub fn is_running(&self) -> bool {
        self.inner.slot.lock().is_some()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
