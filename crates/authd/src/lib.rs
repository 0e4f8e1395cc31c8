// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authd: session and access-token service.
//!
//! Mints HS256 access tokens, keeps one registry record per logged-in
//! device, rotates single-use refresh tokens, and exposes list/revoke over
//! an axum HTTP API.

pub mod config;
pub mod error;
pub mod persist;
pub mod registry;
pub mod state;
pub mod token;
pub mod transport;
pub mod users;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::AuthConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Run the authd server until shutdown.
pub async fn run(config: AuthConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(AppState::new(config, shutdown.clone()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    tracing::info!("authd listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
