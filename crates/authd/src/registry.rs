// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable session registry: one record per logged-in device/browser.
//!
//! Refresh tokens are single-use. `rotate` swaps the stored hash for the
//! next token's hash inside one write-lock critical section, so two
//! concurrent rotations of the same token produce exactly one success —
//! the loser (or a replayed old token) finds no matching hash and is
//! rejected.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::token::{epoch_ms, hash_refresh_token};

/// One login on one device/browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    /// SHA-256 of the currently valid refresh token. Never the raw value.
    pub refresh_token_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
    pub created_at_ms: u64,
    /// Bumped on every successful rotation.
    pub last_activity_at_ms: u64,
    /// Refresh horizon: rotations after this instant are rejected and the
    /// record is dropped.
    pub expires_at_ms: u64,
}

/// Rotation failure. Wrong, reused, already-rotated, or expired tokens and
/// revoked sessions are deliberately indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

/// In-memory session table with optional JSON persistence.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    store_path: Option<PathBuf>,
}

impl SessionRegistry {
    /// Create a registry, reloading persisted sessions when a store path is
    /// configured and the file exists.
    pub fn new(store_path: Option<PathBuf>) -> Self {
        let mut sessions = HashMap::new();
        if let Some(ref path) = store_path {
            if path.exists() {
                match crate::persist::load(path) {
                    Ok(state) => {
                        let now = epoch_ms();
                        for s in state.sessions {
                            // Sessions past their refresh horizon are not worth restoring.
                            if s.expires_at_ms > now {
                                sessions.insert(s.id.clone(), s);
                            }
                        }
                        tracing::info!(count = sessions.len(), "restored persisted sessions");
                    }
                    Err(e) => {
                        tracing::warn!(err = %e, "failed to load persisted sessions, starting empty");
                    }
                }
            }
        }
        Self { sessions: RwLock::new(sessions), store_path }
    }

    /// Register a new session at login. Stores only the refresh token's hash.
    pub async fn create(
        &self,
        user_id: &str,
        refresh_token: &str,
        device_info: Option<String>,
        ip_address: Option<String>,
        remember_me: bool,
        ttl: std::time::Duration,
    ) -> Session {
        let now = epoch_ms();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            refresh_token_hash: hash_refresh_token(refresh_token),
            device_info,
            ip_address,
            remember_me,
            created_at_ms: now,
            last_activity_at_ms: now,
            expires_at_ms: now + ttl.as_millis() as u64,
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        self.persist(&sessions);
        session
    }

    /// Exchange a presented refresh token: swap in the next token's hash and
    /// bump activity, all under the write lock (compare-and-swap on the old
    /// hash). Expired records are dropped on contact. The refresh horizon is
    /// absolute from login; rotation does not extend it.
    pub async fn rotate(
        &self,
        presented: &str,
        next_refresh_token: &str,
    ) -> Result<Session, Rejected> {
        let presented_hash = hash_refresh_token(presented);
        let now = epoch_ms();
        let mut sessions = self.sessions.write().await;

        let id = sessions
            .values()
            .find(|s| s.refresh_token_hash == presented_hash)
            .map(|s| s.id.clone())
            .ok_or(Rejected)?;

        if let Some(s) = sessions.get(&id) {
            if s.expires_at_ms <= now {
                sessions.remove(&id);
                self.persist(&sessions);
                return Err(Rejected);
            }
        }

        let session = sessions.get_mut(&id).ok_or(Rejected)?;
        session.refresh_token_hash = hash_refresh_token(next_refresh_token);
        session.last_activity_at_ms = now;
        let out = session.clone();
        self.persist(&sessions);
        Ok(out)
    }

    /// All sessions for a user, most recently active first.
    pub async fn list(&self, user_id: &str) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        let mut out: Vec<Session> =
            sessions.values().filter(|s| s.user_id == user_id).cloned().collect();
        out.sort_by(|a, b| b.last_activity_at_ms.cmp(&a.last_activity_at_ms));
        out
    }

    /// Number of live sessions across all users.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Look up a session by id.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Delete a session. Any outstanding refresh token for it becomes
    /// permanently unusable. Returns false if no such session existed.
    pub async fn revoke(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(session_id).is_some();
        if removed {
            self.persist(&sessions);
        }
        removed
    }

    fn persist(&self, sessions: &HashMap<String, Session>) {
        let Some(ref path) = self.store_path else {
            return;
        };
        let state = crate::persist::PersistedSessions {
            sessions: sessions.values().cloned().collect(),
        };
        if let Err(e) = crate::persist::save(path, &state) {
            tracing::warn!(err = %e, "failed to persist sessions");
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
