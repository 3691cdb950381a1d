// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed credential store: JSON token file with atomic writes.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::credential::{Credential, CredentialStore, TokenJar, TokenTtl};

/// Credential store persisted to a JSON file between process runs.
///
/// The in-memory copy is authoritative; the file is rewritten after every
/// change while the lock is still held, so file order matches write order.
pub struct FileStore {
    path: PathBuf,
    ttl: TokenTtl,
    jar: Mutex<TokenJar>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>, ttl: TokenTtl) -> anyhow::Result<Self> {
        let path = path.into();
        let jar = if path.exists() { load(&path)? } else { TokenJar::default() };
        debug!(path = %path.display(), "opened token file");
        Ok(Self { path, ttl, jar: Mutex::new(jar) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist the result, unless it reports no change.
    fn update(&self, change: impl FnOnce(&mut TokenJar) -> bool) -> bool {
        let mut jar = self.jar.lock();
        if !change(&mut jar) {
            return false;
        }
        if let Err(e) = save(&self.path, &jar) {
            warn!(path = %self.path.display(), err = %e, "failed to persist tokens");
        }
        true
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Credential {
        self.jar.lock().credential()
    }

    fn store_pair(&self, access: &str, refresh: &str) {
        let ttl = self.ttl;
        self.update(|jar| {
            jar.set_pair(ttl, access, refresh);
            true
        });
    }

    fn replace_access(&self, exchanged: &str, access: &str, rotated_refresh: Option<&str>) -> bool {
        let ttl = self.ttl;
        self.update(|jar| jar.replace_access(ttl, exchanged, access, rotated_refresh))
    }

    fn clear(&self) {
        self.update(|jar| {
            jar.clear();
            true
        });
    }
}

/// Load a token jar from a JSON file.
pub fn load(path: &Path) -> anyhow::Result<TokenJar> {
    let contents = std::fs::read_to_string(path)?;
    let jar: TokenJar = serde_json::from_str(&contents)?;
    Ok(jar)
}

/// Save a token jar to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) so two processes saving at
/// once never interleave bytes in the same temp file.
pub fn save(path: &Path, jar: &TokenJar) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(jar)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
