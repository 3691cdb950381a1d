// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-visible notification side-channel.
//!
//! The core never renders anything; it emits [`ClientEvent`]s and the host
//! decides how to show them. Sends with no subscribers are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::SessionPhase;

/// Severity of a user notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Danger,
}

/// Events emitted by the client core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A message for the user.
    Notice { level: NoticeLevel, message: String },
    /// The session moved to a new phase.
    SessionChanged { phase: SessionPhase },
    /// A new access token was obtained from the refresh endpoint.
    TokenRefreshed,
}

/// Cloneable sender half of the event channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ClientEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn send(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(ClientEvent::Notice { level: NoticeLevel::Success, message: message.into() });
    }

    pub fn danger(&self, message: impl Into<String>) {
        self.send(ClientEvent::Notice { level: NoticeLevel::Danger, message: message.into() });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
