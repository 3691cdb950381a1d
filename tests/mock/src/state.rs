// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A stored country, serialized the way the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: u64,
    pub name: String,
    pub capital: String,
    pub region: String,
    pub subregion: String,
    pub population: u64,
    pub area: f64,
    pub languages: Vec<String>,
    pub currencies: Vec<String>,
    pub timezones: Vec<String>,
    pub flag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Behaviour switches flipped by tests.
#[derive(Debug, Default)]
pub struct Knobs {
    /// Refresh endpoint answers 401 for every token.
    pub reject_refresh: AtomicBool,
    /// Resource endpoints answer 401 even for freshly issued access tokens.
    pub reject_all_access: AtomicBool,
    /// List endpoint answers 500.
    pub fail_list: AtomicBool,
    /// Delete endpoint answers 500.
    pub fail_delete: AtomicBool,
    /// Logout endpoint answers 500.
    pub fail_logout: AtomicBool,
    /// Refresh endpoint returns a rotated refresh token alongside the access token.
    pub rotate_refresh: AtomicBool,
    /// Artificial latency of the refresh endpoint in milliseconds.
    pub refresh_delay_ms: AtomicU64,
    page_delays: Mutex<HashMap<u32, Duration>>,
}

impl Knobs {
    pub fn is_set(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }

    /// Delay list responses for `page` by `delay`.
    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.page_delays.lock().insert(page, delay);
    }

    pub fn page_delay(&self, page: u32) -> Option<Duration> {
        self.page_delays.lock().get(&page).copied()
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms.load(Ordering::SeqCst))
    }
}

/// Per-endpoint call counters.
#[derive(Debug, Default)]
struct Counters {
    list: AtomicU32,
    create: AtomicU32,
    delete: AtomicU32,
    login: AtomicU32,
    refresh: AtomicU32,
    logout: AtomicU32,
}

/// Snapshot of the call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: u32,
    pub create: u32,
    pub delete: u32,
    pub login: u32,
    pub refresh: u32,
    pub logout: u32,
}

/// Endpoint whose call is being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    List,
    Create,
    Delete,
    Login,
    Refresh,
    Logout,
}

#[derive(Debug, Default)]
struct TokenTable {
    access: HashSet<String>,
    refresh: HashSet<String>,
    blacklisted: HashSet<String>,
}

/// Shared state of the fake API.
pub struct MockState {
    countries: Mutex<Vec<CountryRecord>>,
    next_id: AtomicU64,
    users: HashMap<String, String>,
    tokens: Mutex<TokenTable>,
    counters: Counters,
    pub knobs: Knobs,
}

impl MockState {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            countries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            users,
            tokens: Mutex::new(TokenTable::default()),
            counters: Counters::default(),
            knobs: Knobs::default(),
        }
    }

    // -- Call accounting -----------------------------------------------------

    pub fn record(&self, endpoint: Endpoint) {
        let counter = match endpoint {
            Endpoint::List => &self.counters.list,
            Endpoint::Create => &self.counters.create,
            Endpoint::Delete => &self.counters.delete,
            Endpoint::Login => &self.counters.login,
            Endpoint::Refresh => &self.counters.refresh,
            Endpoint::Logout => &self.counters.logout,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            list: c.list.load(Ordering::SeqCst),
            create: c.create.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
            login: c.login.load(Ordering::SeqCst),
            refresh: c.refresh.load(Ordering::SeqCst),
            logout: c.logout.load(Ordering::SeqCst),
        }
    }

    // -- Tokens --------------------------------------------------------------

    pub fn check_login(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    pub fn issue_access(&self) -> String {
        let token = format!("access-{}", uuid::Uuid::new_v4());
        self.tokens.lock().access.insert(token.clone());
        token
    }

    pub fn issue_tokens(&self) -> (String, String) {
        let refresh = format!("refresh-{}", uuid::Uuid::new_v4());
        self.tokens.lock().refresh.insert(refresh.clone());
        (self.issue_access(), refresh)
    }

    /// Rotate a refresh token: the old one stops working.
    pub fn rotate(&self, old: &str) -> String {
        let refresh = format!("refresh-{}", uuid::Uuid::new_v4());
        let mut tokens = self.tokens.lock();
        tokens.refresh.remove(old);
        tokens.blacklisted.insert(old.to_owned());
        tokens.refresh.insert(refresh.clone());
        refresh
    }

    /// Expire every access token issued so far.
    pub fn revoke_access_tokens(&self) {
        self.tokens.lock().access.clear();
    }

    pub fn access_valid(&self, token: &str) -> bool {
        !Knobs::is_set(&self.knobs.reject_all_access) && self.tokens.lock().access.contains(token)
    }

    pub fn refresh_valid(&self, token: &str) -> bool {
        let tokens = self.tokens.lock();
        tokens.refresh.contains(token) && !tokens.blacklisted.contains(token)
    }

    /// Blacklist a refresh token. Returns false if it was not valid.
    pub fn blacklist(&self, token: &str) -> bool {
        let mut tokens = self.tokens.lock();
        if !tokens.refresh.contains(token) || tokens.blacklisted.contains(token) {
            return false;
        }
        tokens.blacklisted.insert(token.to_owned())
    }

    pub fn is_blacklisted(&self, token: &str) -> bool {
        self.tokens.lock().blacklisted.contains(token)
    }

    // -- Countries -----------------------------------------------------------

    pub fn seed_country(&self, name: &str, region: &str) -> CountryRecord {
        self.insert(CountryRecord {
            id: 0,
            name: name.to_owned(),
            capital: String::new(),
            region: region.to_owned(),
            subregion: String::new(),
            population: 0,
            area: 0.0,
            languages: vec!["English".to_owned()],
            currencies: Vec::new(),
            timezones: Vec::new(),
            flag: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }

    /// Store a record, assigning its id and timestamps.
    pub fn insert(&self, mut record: CountryRecord) -> CountryRecord {
        record.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = epoch_ms().to_string();
        record.created_at = now.clone();
        record.updated_at = now;
        self.countries.lock().push(record.clone());
        record
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut countries = self.countries.lock();
        let before = countries.len();
        countries.retain(|c| c.id != id);
        countries.len() != before
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.countries.lock().iter().any(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.countries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in list order (case-insensitive by name).
    pub fn sorted(&self) -> Vec<CountryRecord> {
        let mut all = self.countries.lock().clone();
        all.sort_by(|a, b| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.name.cmp(&b.name))
        });
        all
    }

    /// Id of the record named `name`, if any.
    pub fn id_of(&self, name: &str) -> Option<u64> {
        self.countries.lock().iter().find(|c| c.name == name).map(|c| c.id)
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
