// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP wire layer for the countries API: URL construction and the raw
//! endpoint calls. No retry or session logic lives here.

use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::LoginError;

/// Page size agreed with the server.
pub const PAGE_SIZE: u32 = 25;

/// A resource request that can be sent more than once (the 401 retry resends it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, body: None }
    }

    pub fn post(url: Url, body: Value) -> Self {
        Self { method: Method::POST, url, body: Some(body) }
    }

    pub fn delete(url: Url) -> Self {
        Self { method: Method::DELETE, url, body: None }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

/// Token pair issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// `POST <auth>token/refresh/` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Present when the server rotates refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

/// HTTP client for one countries API server.
pub struct ApiClient {
    collection: Url,
    auth: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        crate::ensure_crypto();
        let base = Url::parse(&config.base_url)?;
        let collection = base.join(&config.collection_path)?;
        let auth = base.join(&config.auth_path)?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { collection, auth, client })
    }

    pub fn collection_url(&self) -> Url {
        self.collection.clone()
    }

    /// Direct page-number URL, built from the fixed page-size convention.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.collection.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &PAGE_SIZE.to_string());
        url
    }

    /// Resolve a server-supplied `next`/`previous` cursor. Absolute cursors
    /// are used as-is; relative ones are joined onto the collection URL.
    pub fn cursor_url(&self, cursor: &str) -> anyhow::Result<Url> {
        Ok(self.collection.join(cursor)?)
    }

    pub fn item_url(&self, id: u64) -> anyhow::Result<Url> {
        Ok(self.collection.join(&format!("{id}/"))?)
    }

    fn auth_url(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.auth.join(path)?)
    }

    /// Send a resource request, with `bearer` as the access credential.
    pub async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> reqwest::Result<Response> {
        let mut req = self.client.request(request.method.clone(), request.url.clone());
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            req = req.json(body);
        }
        debug!(method = %request.method, url = %request.url, "sending request");
        req.send().await
    }

    /// `POST <auth>login/`: exchange username/password for a token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, LoginError> {
        const FALLBACK: &str = "Login failed. Please try again.";

        let url = self.auth_url("login/").map_err(|e| LoginError::Failed(e.to_string()))?;
        let resp = self
            .client
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| {
                debug!(err = %e, "login request failed");
                LoginError::Failed(FALLBACK.to_owned())
            })?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(LoginError::InvalidCredentials);
        }
        if !status.is_success() {
            let body: Option<Value> = resp.json().await.ok();
            let detail = body
                .as_ref()
                .and_then(|b| b.get("detail"))
                .and_then(Value::as_str)
                .unwrap_or(FALLBACK);
            return Err(LoginError::Failed(detail.to_owned()));
        }

        let body: LoginResponse = resp.json().await.map_err(|e| {
            debug!(err = %e, "undecodable login response");
            LoginError::InvalidResponse("Invalid response from server".to_owned())
        })?;
        match (body.access, body.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(TokenPair { access, refresh })
            }
            _ => Err(LoginError::InvalidResponse("Invalid response from server".to_owned())),
        }
    }

    /// `POST <auth>token/refresh/`: a single exchange, no retries.
    pub async fn exchange_refresh(&self, refresh_token: &str) -> anyhow::Result<RefreshResponse> {
        let url = self.auth_url("token/refresh/")?;
        let resp =
            self.client.post(url).json(&RefreshRequest { refresh: refresh_token }).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("refresh failed ({status}): {text}");
        }

        let token: RefreshResponse = resp.json().await?;
        Ok(token)
    }

    /// `GET <auth>logout/?refresh_token=...`: server-side invalidation of the
    /// refresh token. Returns the response status; the caller decides how
    /// much a failure matters.
    pub async fn logout(&self, access: Option<&str>, refresh_token: &str) -> anyhow::Result<StatusCode> {
        let mut url = self.auth_url("logout/")?;
        url.query_pairs_mut().append_pair("refresh_token", refresh_token);
        let mut req = self.client.get(url);
        if let Some(token) = access {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        Ok(resp.status())
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
