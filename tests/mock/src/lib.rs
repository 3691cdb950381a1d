// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fake of the countries REST API.
//!
//! Serves the list/create/delete and login/refresh/logout contract on an
//! ephemeral localhost port, with knobs for revoking tokens, rejecting
//! refreshes, slowing pages down and counting calls. Test tooling only.

pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use crate::http::build_router;
pub use crate::state::{CallCounts, CountryRecord, Endpoint, Knobs, MockState};

/// Username accepted by [`MockApi::new`].
pub const DEFAULT_USER: &str = "alice";
/// Password of [`DEFAULT_USER`].
pub const DEFAULT_PASSWORD: &str = "wonderland";

/// Builder for a seeded fake API.
pub struct MockApi {
    users: Vec<(String, String)>,
    countries: Vec<(String, String)>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Empty collection with the default user.
    pub fn new() -> Self {
        Self {
            users: vec![(DEFAULT_USER.to_owned(), DEFAULT_PASSWORD.to_owned())],
            countries: Vec::new(),
        }
    }

    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users.push((username.to_owned(), password.to_owned()));
        self
    }

    pub fn country(mut self, name: &str, region: &str) -> Self {
        self.countries.push((name.to_owned(), region.to_owned()));
        self
    }

    pub fn countries<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.countries.push((name.to_owned(), "Europe".to_owned()));
        }
        self
    }

    /// Seed `count` countries named `"<prefix> 001"`, `"<prefix> 002"`, ...
    pub fn numbered(mut self, prefix: &str, count: usize) -> Self {
        for i in 1..=count {
            self.countries.push((format!("{prefix} {i:03}"), "Europe".to_owned()));
        }
        self
    }

    pub fn build(self) -> Arc<MockState> {
        let state = MockState::new(self.users.into_iter().collect());
        for (name, region) in &self.countries {
            state.seed_country(name, region);
        }
        Arc::new(state)
    }

    /// Serve the fake API on `127.0.0.1:0`.
    pub async fn spawn(self) -> anyhow::Result<MockServer> {
        let state = self.build();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = build_router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        tracing::debug!(%addr, "mock countries api listening");
        Ok(MockServer { addr, state })
    }
}

/// A running fake API.
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Issue a valid access/refresh pair without going through login.
    pub fn issue_tokens(&self) -> (String, String) {
        self.state.issue_tokens()
    }

    pub fn calls(&self) -> CallCounts {
        self.state.calls()
    }
}
