// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target-page arithmetic after mutations, and the page-local search filter.
//!
//! The client only knows the current page, so placement after a create is an
//! approximation: the created item is ranked among the visible items only.

use crate::api::PAGE_SIZE;
use crate::model::Country;

/// 1-based page holding the 0-based `index`.
pub fn page_for_index(index: usize) -> u32 {
    let page = index / PAGE_SIZE as usize;
    u32::try_from(page).unwrap_or(u32::MAX - 1).saturating_add(1)
}

/// Page to load after creating `created_name`.
///
/// Ranks the created name among the current items by case-insensitive name.
/// `created_id` excludes the created record if it already appears among them.
pub fn after_create(items: &[Country], created_id: Option<u64>, created_name: &str) -> u32 {
    let key = created_name.to_lowercase();
    let mut names: Vec<String> = items
        .iter()
        .filter(|c| Some(c.id) != created_id)
        .map(|c| c.name.to_lowercase())
        .collect();
    names.push(key.clone());
    names.sort();
    let index = names.iter().position(|n| *n == key).unwrap_or_default();
    page_for_index(index)
}

/// Page to load after deleting one item from page `current` that held
/// `items_on_page` items. Deleting the sole item of a later page steps back.
pub fn after_delete(current: u32, items_on_page: usize) -> u32 {
    if items_on_page == 1 && current > 1 {
        current - 1
    } else {
        current
    }
}

/// Number of pages for `count` items; zero for an empty collection.
pub fn total_pages(count: u64) -> u32 {
    u32::try_from(count.div_ceil(u64::from(PAGE_SIZE))).unwrap_or(u32::MAX)
}

/// Case-insensitive substring filter. An empty term keeps every item.
pub fn filter(items: &[Country], term: &str) -> Vec<Country> {
    if term.is_empty() {
        return items.to_vec();
    }
    let needle = term.to_lowercase();
    items.iter().filter(|c| c.name.to_lowercase().contains(&needle)).cloned().collect()
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;
