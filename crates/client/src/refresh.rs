// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight exchange of the refresh token for a new access token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::AuthError;
use crate::events::ClientEvent;
use crate::session::SessionSignal;

type Flight = Shared<BoxFuture<'static, Result<String, AuthError>>>;

/// Exchanges the refresh token for a new access token.
///
/// Concurrent callers share one exchange: whoever arrives while a flight is
/// pending awaits that flight and observes its result. The flight removes
/// itself once it completes, so the next expiry starts a fresh exchange.
/// A flight holds only a weak handle to its coordinator.
pub struct RefreshCoordinator {
    api: Arc<ApiClient>,
    signal: Arc<SessionSignal>,
    in_flight: Mutex<Option<Flight>>,
    exchanges: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    pub fn new(api: Arc<ApiClient>, signal: Arc<SessionSignal>) -> Arc<Self> {
        Arc::new(Self {
            api,
            signal,
            in_flight: Mutex::new(None),
            exchanges: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Obtain a new access token, joining the pending exchange if there is one.
    ///
    /// Failure of either kind has already forced logout by the time it is
    /// returned, except when the session was ended or replaced while the
    /// exchange was pending. The new token is then dropped unwritten.
    pub async fn refresh(self: &Arc<Self>) -> Result<String, AuthError> {
        let flight = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(flight) => {
                    debug!("joining pending token refresh");
                    flight.clone()
                }
                None => {
                    let exchange = exchange(
                        Arc::clone(&self.api),
                        Arc::clone(&self.signal),
                        Arc::clone(&self.exchanges),
                    );
                    let owner = Arc::downgrade(self);
                    let flight = async move {
                        let result = exchange.await;
                        if let Some(owner) = owner.upgrade() {
                            owner.in_flight.lock().take();
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// Number of exchanges sent to the refresh endpoint so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }
}

async fn exchange(
    api: Arc<ApiClient>,
    signal: Arc<SessionSignal>,
    exchanges: Arc<AtomicU64>,
) -> Result<String, AuthError> {
    let Some(refresh_token) = signal.store().load().refresh_token else {
        warn!("no refresh token available, forcing logout");
        signal.force_logout();
        return Err(AuthError::NoRefreshToken);
    };

    exchanges.fetch_add(1, Ordering::Relaxed);
    match api.exchange_refresh(&refresh_token).await {
        Ok(token) => {
            let stored =
                signal.store().replace_access(&refresh_token, &token.access, token.refresh.as_deref());
            if !stored {
                debug!("session ended during refresh, discarding new access token");
                return Err(AuthError::RefreshRejected);
            }
            debug!(rotated = token.refresh.is_some(), "access token refreshed");
            signal.notifier().send(ClientEvent::TokenRefreshed);
            Ok(token.access)
        }
        Err(e) => {
            warn!(err = %e, "token refresh rejected, forcing logout");
            signal.force_logout();
            Err(AuthError::RefreshRejected)
        }
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
