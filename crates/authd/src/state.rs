// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use crate::config::AuthConfig;
use crate::registry::SessionRegistry;
use crate::token::TokenSigner;
use crate::users::UserStore;

/// Shared authd state.
pub struct AppState {
    pub config: AuthConfig,
    pub registry: SessionRegistry,
    pub users: UserStore,
    pub signer: TokenSigner,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AuthConfig, shutdown: CancellationToken) -> Self {
        let store_path = config.state_dir.as_ref().map(|d| d.join("sessions.json"));
        let signer = TokenSigner::new(config.secret.as_bytes());
        Self {
            registry: SessionRegistry::new(store_path),
            users: UserStore::new(),
            signer,
            config,
            shutdown,
        }
    }
}
