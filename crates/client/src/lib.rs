// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Countries client core: bearer-token session lifecycle and a
//! server-paginated collection view that stays consistent across search,
//! navigation, and mutations.

pub mod api;
pub mod cli;
pub mod collection;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod fetch;
pub mod model;
pub mod refresh;
pub mod session;
pub mod validate;


use std::sync::Once;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
