// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal user store. Credential verification is a boundary here, not a
//! product surface: enough to exercise login end to end.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// Public user record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

struct StoredUser {
    user: User,
    salt: String,
    password_hash: String,
}

/// In-memory user table keyed by lowercased email.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user. Fails if the email is taken.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Option<User> {
        let key = email.to_lowercase();
        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return None;
        }
        let salt = generate_salt();
        let user = User { id: uuid::Uuid::new_v4().to_string(), email: key.clone(), name };
        let stored = StoredUser {
            user: user.clone(),
            password_hash: hash_password(&salt, password),
            salt,
        };
        users.insert(key, stored);
        Some(user)
    }

    /// Verify credentials, returning the user on success.
    pub async fn verify(&self, email: &str, password: &str) -> Option<User> {
        let users = self.users.read().await;
        let stored = users.get(&email.to_lowercase())?;
        if constant_time_eq(&hash_password(&stored.salt, password), &stored.password_hash) {
            Some(stored.user.clone())
        } else {
            None
        }
    }

    /// Look up a user by id.
    pub async fn get(&self, user_id: &str) -> Option<User> {
        let users = self.users.read().await;
        users.values().find(|s| s.user.id == user_id).map(|s| s.user.clone())
    }
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
