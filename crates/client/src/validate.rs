// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure validation of a create form before it is submitted.

use regex::Regex;

use crate::error::FieldErrors;
use crate::model::NewCountry;

const MAX_POPULATION: f64 = 1e10;
const MAX_AREA: f64 = 1e8;
const MAX_LANGUAGES: usize = 100;
const MAX_CURRENCIES: usize = 50;
const MAX_TIMEZONES: usize = 50;

/// Raw create form: every field as typed by the user.
///
/// List fields are comma-separated; numeric fields are parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, clap::Args)]
pub struct CountryDraft {
    /// Country name (required).
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub capital: String,

    /// Region (required).
    #[arg(long, default_value = "")]
    pub region: String,

    #[arg(long, default_value = "")]
    pub subregion: String,

    #[arg(long, default_value = "")]
    pub population: String,

    /// Area in square kilometres.
    #[arg(long, default_value = "")]
    pub area: String,

    /// Comma-separated list.
    #[arg(long, default_value = "")]
    pub languages: String,

    /// Comma-separated list.
    #[arg(long, default_value = "")]
    pub currencies: String,

    /// Comma-separated list.
    #[arg(long, default_value = "")]
    pub timezones: String,

    /// Flag image URL.
    #[arg(long, default_value = "")]
    pub flag: String,

    /// Two-letter uppercase country code.
    #[arg(long, default_value = "")]
    pub cca2: String,
}

/// Compiled form rules.
pub struct DraftValidator {
    place: Regex,
    flag: Regex,
    cca2: Regex,
}

impl DraftValidator {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            place: Regex::new(r"^[a-zA-Z\s'\-,.]+$")?,
            flag: Regex::new(r#"^https?://[^\s<>"]+|www\.[^\s<>"]+$"#)?,
            cca2: Regex::new(r"^[A-Z]{2}$")?,
        })
    }

    /// Check every field and build the payload. All failing fields are
    /// reported together, one message per field.
    pub fn validate(&self, draft: &CountryDraft) -> Result<NewCountry, FieldErrors> {
        let mut errors = FieldErrors::new();
        const CHARSET: &str = "can only contain letters, spaces, apostrophes, hyphens, commas, or periods.";

        let name = draft.name.trim();
        if name.is_empty() {
            errors.insert("name", "Name is required.");
        } else if name.chars().count() < 2 {
            errors.insert("name", "Name must be at least 2 characters long.");
        } else if !self.place.is_match(name) {
            errors.insert("name", format!("Name {CHARSET}"));
        }

        let capital = draft.capital.trim();
        if !capital.is_empty() && !self.place.is_match(capital) {
            errors.insert("capital", format!("Capital {CHARSET}"));
        }

        let region = draft.region.trim();
        if region.is_empty() {
            errors.insert("region", "Region is required.");
        } else if !self.place.is_match(region) {
            errors.insert("region", format!("Region {CHARSET}"));
        }

        let subregion = draft.subregion.trim();
        if !subregion.is_empty() && !self.place.is_match(subregion) {
            errors.insert("subregion", format!("Subregion {CHARSET}"));
        }

        let population = bounded_number(&draft.population, MAX_POPULATION, "Population", "population", &mut errors);
        let area = bounded_number(&draft.area, MAX_AREA, "Area", "area", &mut errors);

        let languages = split_list(&draft.languages);
        if languages.len() > MAX_LANGUAGES {
            errors.insert("languages", format!("Too many languages specified (max {MAX_LANGUAGES})."));
        }
        let currencies = split_list(&draft.currencies);
        if currencies.len() > MAX_CURRENCIES {
            errors.insert("currencies", format!("Too many currencies specified (max {MAX_CURRENCIES})."));
        }
        let timezones = split_list(&draft.timezones);
        if timezones.len() > MAX_TIMEZONES {
            errors.insert("timezones", format!("Too many timezones specified (max {MAX_TIMEZONES})."));
        }
        if languages.is_empty() && currencies.is_empty() && timezones.is_empty() {
            errors.insert(
                FieldErrors::GENERAL,
                "At least one of languages, currencies, or timezones must be provided.",
            );
        }

        let flag = draft.flag.trim();
        if !flag.is_empty() && !self.flag.is_match(flag) {
            errors.insert("flag", "Invalid URL format for flag.");
        }

        let cca2 = draft.cca2.trim();
        if !cca2.is_empty() && !self.cca2.is_match(cca2) {
            errors.insert("cca2", "cca2 must be a 2-letter uppercase code.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewCountry {
            name: name.to_owned(),
            capital: capital.to_owned(),
            region: region.to_owned(),
            subregion: subregion.to_owned(),
            population: population.round() as u64,
            area,
            languages,
            currencies,
            timezones,
            flag: flag.to_owned(),
            cca2: cca2.to_owned(),
        })
    }
}

/// Parse an optional non-negative number. Empty input is zero.
fn bounded_number(raw: &str, max: f64, label: &str, field: &str, errors: &mut FieldErrors) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_nan() => {
            errors.insert(field, format!("{label} must be a number."));
            0.0
        }
        Ok(n) if n < 0.0 => {
            errors.insert(field, format!("{label} cannot be negative."));
            0.0
        }
        Ok(n) if n > max => {
            errors.insert(field, format!("{label} exceeds realistic limits."));
            0.0
        }
        Ok(n) => n,
        Err(_) => {
            errors.insert(field, format!("{label} must be a number."));
            0.0
        }
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
