// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire records of the countries collection.

use serde::{Deserialize, Serialize};

/// One country record as returned by the server.
///
/// The core relies on `id` (identity), `name` (sort and search key) and
/// `region`; everything else is carried through for display. Server
/// timestamps are not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub capital: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub timezones: Vec<String>,
    #[serde(default)]
    pub flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cca2: Option<String>,
}

/// Validated create payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCountry {
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
    pub cca2: String,
}

/// `GET <collection>` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub results: Vec<Country>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}
