// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource calls with one 401-triggered refresh-and-retry.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiRequest};
use crate::error::AuthError;
use crate::refresh::RefreshCoordinator;
use crate::session::SessionSignal;

/// Classified outcome of a single send.
enum Attempt {
    Done(Response),
    Unauthorized,
}

/// Wraps resource calls with the session's retry policy.
///
/// A call is at most two attempts: the first, and one more after a
/// successful refresh if the first was unauthorized. Any other failure is
/// returned as-is.
pub struct AuthenticatedFetch {
    api: Arc<ApiClient>,
    refresher: Arc<RefreshCoordinator>,
    signal: Arc<SessionSignal>,
}

impl AuthenticatedFetch {
    pub fn new(
        api: Arc<ApiClient>,
        refresher: Arc<RefreshCoordinator>,
        signal: Arc<SessionSignal>,
    ) -> Self {
        Self { api, refresher, signal }
    }

    /// Send `request` with `access_token` as the bearer credential.
    ///
    /// A missing token counts as an unauthorized first attempt.
    pub async fn call(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Response, AuthError> {
        if let Attempt::Done(resp) = self.attempt(request, access_token).await? {
            return Ok(resp);
        }

        let token = match self.refresher.refresh().await {
            Ok(token) => token,
            Err(e) => {
                debug!(err = %e, url = %request.url, "refresh failed, not retrying");
                return Err(AuthError::Unauthorized);
            }
        };

        match self.attempt(request, Some(token.as_str())).await? {
            Attempt::Done(resp) => Ok(resp),
            Attempt::Unauthorized => {
                warn!(url = %request.url, "still unauthorized after refresh, forcing logout");
                self.signal.force_logout();
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// [`call`](Self::call) with the access token currently in the store.
    pub async fn call_current(&self, request: &ApiRequest) -> Result<Response, AuthError> {
        let access = self.signal.store().load().access_token;
        self.call(request, access.as_deref()).await
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Attempt, AuthError> {
        let Some(token) = bearer else {
            debug!(url = %request.url, "no access token, treating as unauthorized");
            return Ok(Attempt::Unauthorized);
        };

        let resp = self.api.send(request, Some(token)).await.map_err(|e| {
            warn!(err = %e, url = %request.url, "request failed");
            AuthError::RequestFailed { status: None, body: None }
        })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!(url = %request.url, "unauthorized");
            return Ok(Attempt::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.json::<Value>().await.ok();
            debug!(%status, url = %request.url, "request rejected");
            return Err(AuthError::RequestFailed { status: Some(status.as_u16()), body });
        }
        Ok(Attempt::Done(resp))
    }
}

/// Decode a success body.
pub async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, AuthError> {
    resp.json::<T>().await.map_err(|e| AuthError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
