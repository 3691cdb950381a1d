// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paginated view of the countries collection.
//!
//! Holds exactly one server page at a time. Every successful load replaces
//! the page wholesale, so count, cursors and page number always come from the
//! same response. Loads are sequence-tagged; only the most recently issued
//! load may apply its result.

pub mod placement;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiRequest};
use crate::error::{AuthError, CollectionError, FieldErrors};
use crate::fetch::{decode, AuthenticatedFetch};
use crate::model::{Country, ListResponse, NewCountry};
use crate::session::SessionSignal;

/// Shown alongside filtered results while a search term is set.
pub const SEARCH_DISCLAIMER: &str = "Search applies to current page only.";

const FETCH_FAILED: &str = "Failed to fetch countries. Please try again later.";
const CREATE_FAILED: &str = "Failed to add country.";
const CREATE_INVALID: &str = "Failed to add country. Please try again.";
const DELETE_FAILED: &str = "Failed to delete country.";

/// One server page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Country>,
    pub total_count: u64,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
    pub page_number: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            next_cursor: None,
            previous_cursor: None,
            page_number: 1,
        }
    }
}

/// Which page to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Direct jump, 1-based.
    Number(u32),
    /// A `next`/`previous` URL handed out by the server, with the page
    /// number it leads to.
    Cursor { url: String, page_number: u32 },
}

#[derive(Debug, Default)]
struct ViewState {
    page: Page,
    search: String,
}

/// Current page, search term and the mutations that reposition the view.
pub struct CollectionController {
    api: Arc<ApiClient>,
    fetch: Arc<AuthenticatedFetch>,
    signal: Arc<SessionSignal>,
    issued: AtomicU64,
    state: Mutex<ViewState>,
}

impl CollectionController {
    pub fn new(
        api: Arc<ApiClient>,
        fetch: Arc<AuthenticatedFetch>,
        signal: Arc<SessionSignal>,
    ) -> Self {
        Self { api, fetch, signal, issued: AtomicU64::new(0), state: Mutex::new(ViewState::default()) }
    }

    /// Fetch a page and make it current.
    ///
    /// On failure the previous page stays in place, except that an auth
    /// failure empties the view. A load overtaken by a newer one returns
    /// [`CollectionError::Superseded`] and changes nothing.
    pub async fn load_page(&self, request: PageRequest) -> Result<Page, CollectionError> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.fetch_page(request).await;

        let outcome = {
            let mut state = self.state.lock();
            if self.issued.load(Ordering::SeqCst) != seq {
                debug!(seq, "discarding superseded page load");
                return Err(CollectionError::Superseded);
            }
            match result {
                Ok(page) => {
                    state.page = page.clone();
                    Ok(page)
                }
                Err(e) => {
                    if e.is_auth_failure() {
                        *state = ViewState::default();
                    }
                    Err(e)
                }
            }
        };

        match outcome {
            Ok(page) => {
                info!(
                    page = page.page_number,
                    items = page.items.len(),
                    total = page.total_count,
                    "page loaded"
                );
                Ok(page)
            }
            Err(e) => {
                debug!(err = %e, "page load failed");
                self.signal.notifier().danger(FETCH_FAILED);
                Err(CollectionError::FetchFailed(e))
            }
        }
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Page, AuthError> {
        let (url, page_number) = match request {
            PageRequest::Number(n) => {
                let n = n.max(1);
                (self.api.page_url(n), n)
            }
            PageRequest::Cursor { url, page_number } => {
                let url = self
                    .api
                    .cursor_url(&url)
                    .map_err(|e| AuthError::InvalidResponse(format!("bad cursor: {e}")))?;
                (url, page_number.max(1))
            }
        };
        let resp = self.fetch.call_current(&ApiRequest::get(url)).await?;
        let body: ListResponse = decode(resp).await?;
        Ok(Page {
            items: body.results,
            total_count: body.count,
            next_cursor: body.next,
            previous_cursor: body.previous,
            page_number,
        })
    }

    /// Create a country, then load the page it most likely landed on.
    pub async fn create(&self, country: &NewCountry) -> Result<Page, CollectionError> {
        let body = serde_json::to_value(country).map_err(|e| {
            CollectionError::MutationFailed(AuthError::InvalidResponse(e.to_string()))
        })?;
        let request = ApiRequest::post(self.api.collection_url(), body);

        let resp = match self.fetch.call_current(&request).await {
            Ok(resp) => resp,
            Err(AuthError::RequestFailed { status: Some(400), body }) => {
                let errors = FieldErrors::from_body(body.as_ref(), CREATE_INVALID);
                debug!(%errors, "create rejected");
                return Err(CollectionError::Invalid(errors));
            }
            Err(e) => {
                if e.is_auth_failure() {
                    self.reset();
                }
                self.signal.notifier().danger(e.detail().unwrap_or(CREATE_FAILED));
                return Err(CollectionError::MutationFailed(e));
            }
        };

        // Created but undecodable still counts as created; rank it by the submitted name.
        let created = decode::<Country>(resp).await.ok();
        let created_id = created.as_ref().map(|c| c.id);
        let name = created.map_or_else(|| country.name.clone(), |c| c.name);

        let target = {
            let state = self.state.lock();
            placement::after_create(&state.page.items, created_id, &name)
        };
        info!(%name, ?created_id, target, "country created");
        self.signal.notifier().success(format!("Country '{name}' added successfully."));
        self.load_page(PageRequest::Number(target)).await
    }

    /// Delete a country, then reload the page the view should show.
    pub async fn delete(&self, id: u64) -> Result<Page, CollectionError> {
        let url = self.api.item_url(id).map_err(|e| {
            CollectionError::MutationFailed(AuthError::InvalidResponse(e.to_string()))
        })?;

        if let Err(e) = self.fetch.call_current(&ApiRequest::delete(url)).await {
            if e.is_auth_failure() {
                self.reset();
            }
            self.signal.notifier().danger(DELETE_FAILED);
            return Err(CollectionError::MutationFailed(e));
        }

        let target = {
            let state = self.state.lock();
            placement::after_delete(state.page.page_number, state.page.items.len())
        };
        info!(id, target, "country deleted");
        self.signal.notifier().success("Country deleted successfully.");
        self.load_page(PageRequest::Number(target)).await
    }

    /// Set the search term and return the matching items of the current page.
    pub fn search(&self, term: &str) -> Vec<Country> {
        let mut state = self.state.lock();
        state.search = term.to_owned();
        placement::filter(&state.page.items, &state.search)
    }

    /// Items of the current page that match the remembered search term.
    pub fn visible(&self) -> Vec<Country> {
        let state = self.state.lock();
        placement::filter(&state.page.items, &state.search)
    }

    pub fn search_term(&self) -> String {
        self.state.lock().search.clone()
    }

    /// Notice to show with search results, while a term is set.
    pub fn search_disclaimer(&self) -> Option<&'static str> {
        (!self.state.lock().search.is_empty()).then_some(SEARCH_DISCLAIMER)
    }

    /// Follow the server's `next` cursor. `None` on the last page.
    pub async fn next(&self) -> Option<Result<Page, CollectionError>> {
        let request = {
            let state = self.state.lock();
            let url = state.page.next_cursor.clone()?;
            PageRequest::Cursor { url, page_number: state.page.page_number.saturating_add(1) }
        };
        Some(self.load_page(request).await)
    }

    /// Follow the server's `previous` cursor. `None` on the first page.
    pub async fn previous(&self) -> Option<Result<Page, CollectionError>> {
        let request = {
            let state = self.state.lock();
            let url = state.page.previous_cursor.clone()?;
            PageRequest::Cursor { url, page_number: state.page.page_number.saturating_sub(1) }
        };
        Some(self.load_page(request).await)
    }

    pub fn total_pages(&self) -> u32 {
        placement::total_pages(self.state.lock().page.total_count)
    }

    /// Page numbers for direct jumps, `1..=total_pages`.
    pub fn page_numbers(&self) -> Vec<u32> {
        (1..=self.total_pages()).collect()
    }

    /// Snapshot of the current page.
    pub fn current(&self) -> Page {
        self.state.lock().page.clone()
    }

    /// Drop the page and search term. Pending loads are superseded.
    pub fn reset(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = ViewState::default();
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
