// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential storage: the access/refresh token pair with independent expiries.
//!
//! Every read and write of the pair goes through [`CredentialStore`]. Both
//! implementations keep the pair behind a single lock, so a reader never sees
//! one token from before a write and one from after it.

pub mod persist;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default lifetime of an access token (60 minutes).
pub const ACCESS_TTL: Duration = Duration::from_secs(60 * 60);

/// Default lifetime of a refresh token (7 days).
pub const REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Snapshot of the tokens that are currently valid. Expired tokens read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credential {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Lifetimes applied when tokens are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self { access: ACCESS_TTL, refresh: REFRESH_TTL }
    }
}

/// Narrow interface over wherever the host keeps the two tokens.
///
/// Only the refresh coordinator and the login/logout paths write through it.
pub trait CredentialStore: Send + Sync {
    /// Read both tokens atomically.
    fn load(&self) -> Credential;

    /// Store a freshly issued pair (login).
    fn store_pair(&self, access: &str, refresh: &str);

    /// Overwrite the access token (refresh), but only while the stored refresh
    /// token is still `exchanged`. A rotated refresh token, if the server
    /// issued one, replaces the old one in the same write.
    ///
    /// Returns false and writes nothing when the pair was cleared or replaced
    /// after the exchange started.
    fn replace_access(&self, exchanged: &str, access: &str, rotated_refresh: Option<&str>) -> bool;

    /// Remove both tokens.
    fn clear(&self);
}

/// One stored token and its expiry as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: u64,
}

impl StoredToken {
    pub fn issue(value: &str, ttl: Duration) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self { value: value.to_owned(), expires_at: epoch_ms().saturating_add(ttl_ms) }
    }

    fn live(&self, now: u64) -> Option<String> {
        (self.expires_at > now).then(|| self.value.clone())
    }
}

/// The token pair as held in memory and on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenJar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<StoredToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<StoredToken>,
}

impl TokenJar {
    pub fn credential(&self) -> Credential {
        let now = epoch_ms();
        Credential {
            access_token: self.access.as_ref().and_then(|t| t.live(now)),
            refresh_token: self.refresh.as_ref().and_then(|t| t.live(now)),
        }
    }

    pub fn set_pair(&mut self, ttl: TokenTtl, access: &str, refresh: &str) {
        self.access = Some(StoredToken::issue(access, ttl.access));
        self.refresh = Some(StoredToken::issue(refresh, ttl.refresh));
    }

    pub fn replace_access(
        &mut self,
        ttl: TokenTtl,
        exchanged: &str,
        access: &str,
        rotated_refresh: Option<&str>,
    ) -> bool {
        if !self.refresh.as_ref().is_some_and(|t| t.value == exchanged) {
            return false;
        }
        self.access = Some(StoredToken::issue(access, ttl.access));
        if let Some(refresh) = rotated_refresh {
            self.refresh = Some(StoredToken::issue(refresh, ttl.refresh));
        }
        true
    }

    pub fn clear(&mut self) {
        self.access = None;
        self.refresh = None;
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ttl: TokenTtl,
    jar: RwLock<TokenJar>,
}

impl MemoryStore {
    pub fn new(ttl: TokenTtl) -> Self {
        Self { ttl, jar: RwLock::new(TokenJar::default()) }
    }

    /// A store holding `jar` as-is, expiries included.
    pub fn from_jar(ttl: TokenTtl, jar: TokenJar) -> Self {
        Self { ttl, jar: RwLock::new(jar) }
    }

    /// A store already holding a login pair.
    pub fn with_tokens(ttl: TokenTtl, access: &str, refresh: &str) -> Self {
        let store = Self::new(ttl);
        store.store_pair(access, refresh);
        store
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Credential {
        self.jar.read().credential()
    }

    fn store_pair(&self, access: &str, refresh: &str) {
        self.jar.write().set_pair(self.ttl, access, refresh);
    }

    fn replace_access(&self, exchanged: &str, access: &str, rotated_refresh: Option<&str>) -> bool {
        self.jar.write().replace_access(self.ttl, exchanged, access, rotated_refresh)
    }

    fn clear(&self) {
        self.jar.write().clear();
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
