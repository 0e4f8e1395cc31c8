// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential state: the in-memory cell shared by renewal paths, and
//! load/save to a JSON file so renewal continues across process restarts.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::api::TokenPair;

/// The client-held credential set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Shared holder for the current credentials. The renewal coordinator
/// replaces the pair in place; the facade reads and clears it.
#[derive(Default)]
pub struct CredentialCell {
    inner: Mutex<Option<Credentials>>,
}

impl CredentialCell {
    pub fn set(&self, creds: Credentials) {
        *self.inner.lock() = Some(creds);
    }

    /// Swap in a freshly rotated pair, keeping the remember-me choice.
    pub fn replace_tokens(&self, pair: &TokenPair) {
        let mut inner = self.inner.lock();
        let remember_me = inner.as_ref().map(|c| c.remember_me).unwrap_or(false);
        *inner = Some(Credentials {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            remember_me,
        });
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }

    pub fn snapshot(&self) -> Option<Credentials> {
        self.inner.lock().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|c| c.refresh_token.clone())
    }

    pub fn remember_me(&self) -> bool {
        self.inner.lock().as_ref().map(|c| c.remember_me).unwrap_or(false)
    }

    pub fn is_set(&self) -> bool {
        self.inner.lock().is_some()
    }
}

/// Resolve the state directory for sessionkit data.
///
/// Checks `SESSIONKIT_STATE_DIR`, then `$XDG_STATE_HOME/sessionkit`,
/// then `$HOME/.local/state/sessionkit`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SESSIONKIT_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("sessionkit");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/sessionkit");
    }
    PathBuf::from(".sessionkit")
}

/// Load persisted credentials from a JSON file.
pub fn load(path: &Path) -> anyhow::Result<Credentials> {
    let contents = std::fs::read_to_string(path)?;
    let creds: Credentials = serde_json::from_str(&contents)?;
    Ok(creds)
}

/// Save credentials to a JSON file atomically (write tmp + rename).
pub fn save(path: &Path, creds: &Credentials) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(creds)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Delete any persisted credentials. Missing file is not an error.
pub fn remove(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(err = %e, "failed to remove persisted credentials");
        }
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
