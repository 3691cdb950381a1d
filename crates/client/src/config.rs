// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::credential::TokenTtl;

/// Connection and session settings for the countries client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the countries API server.
    #[arg(long, env = "COUNTRIES_URL", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Path of the countries collection, relative to the base URL.
    #[arg(long, env = "COUNTRIES_COLLECTION_PATH", default_value = "/api/v1/countries/")]
    pub collection_path: String,

    /// Path prefix of the auth endpoints (login, token/refresh, logout).
    #[arg(long, env = "COUNTRIES_AUTH_PATH", default_value = "/auth/v1/")]
    pub auth_path: String,

    /// HTTP request timeout in milliseconds.
    #[arg(long, default_value_t = 30000, env = "COUNTRIES_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Lifetime of a stored access token in seconds.
    #[arg(long, default_value_t = 3600, env = "COUNTRIES_ACCESS_TTL_SECS")]
    pub access_ttl_secs: u64,

    /// Lifetime of a stored refresh token in seconds.
    #[arg(long, default_value_t = 604_800, env = "COUNTRIES_REFRESH_TTL_SECS")]
    pub refresh_ttl_secs: u64,

    /// Token file used by the command-line host. Defaults to the state directory.
    #[arg(long, env = "COUNTRIES_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Config pointing at `base_url` with every other setting at its default.
    pub fn for_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection_path: "/api/v1/countries/".to_owned(),
            auth_path: "/auth/v1/".to_owned(),
            timeout_ms: 30000,
            access_ttl_secs: 3600,
            refresh_ttl_secs: 604_800,
            token_file: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid --base-url {:?}: {e}", self.base_url))?;
        for (flag, path) in
            [("--collection-path", &self.collection_path), ("--auth-path", &self.auth_path)]
        {
            if !path.ends_with('/') {
                anyhow::bail!("{flag} must end with '/': {path:?}");
            }
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("--timeout-ms must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn token_ttl(&self) -> TokenTtl {
        TokenTtl {
            access: Duration::from_secs(self.access_ttl_secs),
            refresh: Duration::from_secs(self.refresh_ttl_secs),
        }
    }

    /// Resolved token file path.
    pub fn token_file(&self) -> PathBuf {
        self.token_file.clone().unwrap_or_else(|| state_dir().join("tokens.json"))
    }
}

/// Resolve the state directory for client data.
///
/// Checks `COUNTRIES_STATE_DIR`, then `$XDG_STATE_HOME/countries`,
/// then `$HOME/.local/state/countries`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COUNTRIES_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("countries");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/countries");
    }
    PathBuf::from(".countries")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
