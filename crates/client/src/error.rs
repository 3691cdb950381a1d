// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Failures of the token and transport layer.
///
/// Only one recovery is ever attempted (the single 401 retry in
/// [`crate::fetch::AuthenticatedFetch`]); anything that reaches a caller as
/// one of these has already exhausted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No refresh token was available to exchange.
    NoRefreshToken,
    /// The refresh endpoint refused the exchange or could not be reached.
    RefreshRejected,
    /// The server still answered 401 after the refresh-and-retry.
    Unauthorized,
    /// Any other non-success status. `status` is `None` for transport errors.
    RequestFailed { status: Option<u16>, body: Option<Value> },
    /// A success response whose body could not be decoded.
    InvalidResponse(String),
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRefreshToken => "NO_REFRESH_TOKEN",
            Self::RefreshRejected => "REFRESH_REJECTED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::RequestFailed { .. } => "REQUEST_FAILED",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }

    /// True for failures that end the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshRejected | Self::Unauthorized)
    }

    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => *status,
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// The `detail` string of a DRF-style error body, if present.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { body: Some(body), .. } => body.get("detail")?.as_str(),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { status: Some(status), .. } => {
                write!(f, "{}: status {status}", self.as_str())
            }
            Self::RequestFailed { status: None, .. } => {
                write!(f, "{}: transport error", self.as_str())
            }
            Self::InvalidResponse(reason) => write!(f, "{}: {reason}", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for AuthError {}

/// Failures of the paginated collection controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Loading a page failed. The previously displayed page is kept.
    FetchFailed(AuthError),
    /// A create or delete request failed before any reload happened.
    MutationFailed(AuthError),
    /// The server rejected a create payload with field-level errors.
    Invalid(FieldErrors),
    /// A newer load was issued before this one completed; its result was discarded.
    Superseded,
}

impl CollectionError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "FETCH_FAILED",
            Self::MutationFailed(_) => "MUTATION_FAILED",
            Self::Invalid(_) => "INVALID",
            Self::Superseded => "SUPERSEDED",
        }
    }

    /// The underlying auth/transport failure, if any.
    pub fn auth(&self) -> Option<&AuthError> {
        match self {
            Self::FetchFailed(e) | Self::MutationFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(e) | Self::MutationFailed(e) => write!(f, "{}: {e}", self.as_str()),
            Self::Invalid(errors) => write!(f, "{}: {errors}", self.as_str()),
            Self::Superseded => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Failures of the login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The server answered 400: unknown user or wrong password.
    InvalidCredentials,
    /// The server answered success without both tokens.
    InvalidResponse(String),
    /// Anything else, with the message shown to the user.
    Failed(String),
}

impl LoginError {
    /// Message for the notification channel.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidCredentials => "Invalid username or password.",
            Self::InvalidResponse(reason) | Self::Failed(reason) => reason,
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for LoginError {}

/// Displayable field-level errors, keyed by field name.
///
/// Errors that belong to no single field live under [`FieldErrors::GENERAL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub const GENERAL: &'static str = "general";

    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error recorded for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Map a server error body into field errors.
    ///
    /// Each key of a JSON object becomes one field; list values are joined
    /// with a space. A body without any keys yields `fallback` under
    /// [`FieldErrors::GENERAL`].
    pub fn from_body(body: Option<&Value>, fallback: &str) -> Self {
        let mut errors = Self::new();
        match body {
            Some(Value::Object(map)) => {
                for (field, value) in map {
                    errors.insert(field.as_str(), flatten_messages(value));
                }
            }
            Some(Value::Array(items)) if !items.is_empty() => {
                errors.insert(Self::GENERAL, flatten_messages(&Value::Array(items.clone())));
            }
            _ => {}
        }
        if errors.is_empty() {
            errors.insert(Self::GENERAL, fallback);
        }
        errors
    }
}

fn flatten_messages(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten_messages).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
