// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the authd session service.
#[derive(Debug, Clone, clap::Args)]
pub struct AuthConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "AUTHD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9700, env = "AUTHD_PORT")]
    pub port: u16,

    /// HMAC signing secret for access tokens.
    #[arg(long, env = "AUTHD_SECRET")]
    pub secret: String,

    /// Access token lifetime in seconds.
    #[arg(long, default_value_t = 900, env = "AUTHD_ACCESS_TTL_SECS")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds.
    #[arg(long, default_value_t = 604_800, env = "AUTHD_REFRESH_TTL_SECS")]
    pub refresh_ttl_secs: u64,

    /// Refresh token lifetime in seconds when "remember me" was set at login.
    #[arg(long, default_value_t = 2_592_000, env = "AUTHD_REFRESH_REMEMBER_TTL_SECS")]
    pub refresh_remember_ttl_secs: u64,

    /// Directory for the persisted session registry. If unset, sessions are
    /// held in memory only and do not survive a restart.
    #[arg(long, env = "AUTHD_STATE_DIR")]
    pub state_dir: Option<std::path::PathBuf>,
}

impl AuthConfig {
    pub fn access_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.access_ttl_secs)
    }

    /// Refresh horizon for a session, honoring its "remember me" choice.
    pub fn refresh_ttl(&self, remember_me: bool) -> std::time::Duration {
        if remember_me {
            std::time::Duration::from_secs(self.refresh_remember_ttl_secs)
        } else {
            std::time::Duration::from_secs(self.refresh_ttl_secs)
        }
    }
}
