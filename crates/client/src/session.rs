// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state machine: LoggedOut, Authenticating, LoggedIn.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::collection::{CollectionController, PageRequest};
use crate::config::ClientConfig;
use crate::credential::{Credential, CredentialStore};
use crate::error::{CollectionError, LoginError};
use crate::events::{ClientEvent, Notifier};
use crate::fetch::AuthenticatedFetch;
use crate::refresh::RefreshCoordinator;

/// Phase of the session, without the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    LoggedOut,
    Authenticating,
    LoggedIn,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::Authenticating => "authenticating",
            Self::LoggedIn => "logged_in",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current session state, with a fresh snapshot of the stored tokens when logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    LoggedIn(Credential),
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::LoggedOut => SessionPhase::LoggedOut,
            Self::Authenticating => SessionPhase::Authenticating,
            Self::LoggedIn(_) => SessionPhase::LoggedIn,
        }
    }
}

/// Shared session context: phase, credential store and event channel.
///
/// Every component that can end the session holds one of these; forced
/// logout always goes through [`SessionSignal::force_logout`].
pub struct SessionSignal {
    phase: RwLock<SessionPhase>,
    store: Arc<dyn CredentialStore>,
    notifier: Notifier,
}

impl SessionSignal {
    pub fn new(store: Arc<dyn CredentialStore>, notifier: Notifier) -> Self {
        Self { phase: RwLock::new(SessionPhase::LoggedOut), store, notifier }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.read()
    }

    /// Move to `phase`, emitting `SessionChanged` only on an actual change.
    pub fn set_phase(&self, phase: SessionPhase) {
        let changed = {
            let mut current = self.phase.write();
            let changed = *current != phase;
            *current = phase;
            changed
        };
        if changed {
            info!(%phase, "session phase changed");
            self.notifier.send(ClientEvent::SessionChanged { phase });
        }
    }

    /// Clear both tokens and move to LoggedOut. Idempotent.
    pub fn force_logout(&self) {
        self.store.clear();
        self.set_phase(SessionPhase::LoggedOut);
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

/// Composes the API client, refresh coordinator, authenticated fetch and
/// collection controller into one session.
pub struct SessionController {
    api: Arc<ApiClient>,
    signal: Arc<SessionSignal>,
    refresher: Arc<RefreshCoordinator>,
    collection: Arc<CollectionController>,
}

impl SessionController {
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let api = Arc::new(ApiClient::new(config)?);
        Ok(Self::with_api(api, store, Notifier::default()))
    }

    pub fn with_api(api: Arc<ApiClient>, store: Arc<dyn CredentialStore>, notifier: Notifier) -> Self {
        let signal = Arc::new(SessionSignal::new(store, notifier));
        let refresher = RefreshCoordinator::new(Arc::clone(&api), Arc::clone(&signal));
        let fetch = Arc::new(AuthenticatedFetch::new(
            Arc::clone(&api),
            Arc::clone(&refresher),
            Arc::clone(&signal),
        ));
        let collection =
            Arc::new(CollectionController::new(Arc::clone(&api), fetch, Arc::clone(&signal)));
        Self { api, signal, refresher, collection }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.signal.notifier().subscribe()
    }

    pub fn state(&self) -> SessionState {
        match self.signal.phase() {
            SessionPhase::LoggedOut => SessionState::LoggedOut,
            SessionPhase::Authenticating => SessionState::Authenticating,
            SessionPhase::LoggedIn => SessionState::LoggedIn(self.signal.store().load()),
        }
    }

    pub fn collection(&self) -> &Arc<CollectionController> {
        &self.collection
    }

    pub fn refresher(&self) -> &Arc<RefreshCoordinator> {
        &self.refresher
    }

    /// Validate a persisted session by loading the first page.
    pub async fn initialize(&self) -> SessionState {
        if self.signal.store().load().access_token.is_none() {
            self.signal.set_phase(SessionPhase::LoggedOut);
            return self.state();
        }

        self.signal.set_phase(SessionPhase::Authenticating);
        match self.collection.load_page(PageRequest::Number(1)).await {
            Ok(_) => self.signal.set_phase(SessionPhase::LoggedIn),
            // A newer load or a logout overtook this one; trust the store.
            Err(CollectionError::Superseded) => {
                let phase = if self.signal.store().load().access_token.is_some() {
                    SessionPhase::LoggedIn
                } else {
                    SessionPhase::LoggedOut
                };
                self.signal.set_phase(phase);
            }
            Err(e) => {
                warn!(err = %e, "session validation failed");
                self.force_logout();
                self.signal.notifier().danger("Failed to validate session.");
            }
        }
        self.state()
    }

    /// Exchange credentials for a token pair, then validate the new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, LoginError> {
        let previous = self.signal.phase();
        self.signal.set_phase(SessionPhase::Authenticating);
        match self.api.login(username, password).await {
            Ok(pair) => {
                self.signal.store().store_pair(&pair.access, &pair.refresh);
                info!(username, "logged in");
                self.signal.notifier().success("Login successful!");
                Ok(self.initialize().await)
            }
            Err(e) => {
                warn!(username, err = %e, "login failed");
                self.signal.set_phase(previous);
                self.signal.notifier().danger(e.message());
                Err(e)
            }
        }
    }

    /// Best-effort server logout, then always clear local state.
    pub async fn logout(&self) {
        let credential = self.signal.store().load();
        if let Some(refresh) = credential.refresh_token {
            match self.api.logout(credential.access_token.as_deref(), &refresh).await {
                Ok(status) if status.is_success() => {
                    self.signal.notifier().success("Logout successful!");
                }
                Ok(status) => {
                    warn!(%status, "server logout failed");
                    self.signal.notifier().danger("Logout failed.");
                }
                Err(e) => {
                    warn!(err = %e, "server logout request failed");
                    self.signal.notifier().danger("Error during logout.");
                }
            }
        }
        self.force_logout();
        info!("logged out");
    }

    /// Clear tokens, reset the collection and move to LoggedOut. Idempotent.
    pub fn force_logout(&self) {
        self.signal.force_logout();
        self.collection.reset();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
