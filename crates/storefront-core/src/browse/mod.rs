//! Storefront browsing state machine.
//!
//! [`BrowseState`] owns the shopper's filter state. It is mutated only through
//! [`Action`]s, tells its driver when to fetch via [`Schedule`], and applies a
//! response only when its sequence number is the latest one issued. Rendering
//! is a pure function of the state (see [`render`]).

pub mod render;
pub mod url;

use std::collections::BTreeSet;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::catalog::{rank_facets, CategoryFacet, FilterRequest, Product, SortDirection, SortKey};
use crate::pagination::ResultPage;

pub use render::{render, Card, FacetView, FilterTag, Grid, PaginationView, View};

/// Quiet period before a search edit triggers a fetch.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Quiet period before a price edit triggers a fetch.
pub const PRICE_DEBOUNCE: Duration = Duration::from_millis(600);
/// A fetch with no response after this long is reported as failed.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub categories: BTreeSet<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort: SortKey,
    pub direction: SortDirection,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            categories: BTreeSet::new(),
            price_min: None,
            price_max: None,
            sort: SortKey::Name,
            direction: SortDirection::Asc,
            page: 1,
        }
    }
}

impl FilterState {
    /// Request for the current state at `page_size` rows per page.
    #[must_use]
    pub fn to_request(&self, page_size: u32) -> FilterRequest {
        let search = self.search.trim();
        FilterRequest {
            search: (!search.is_empty()).then(|| search.to_string()),
            categories: self.categories.iter().cloned().collect(),
            price_min: self.price_min.map(|p| p.normalize().to_string()),
            price_max: self.price_max.map(|p| p.normalize().to_string()),
            sort: Some(self.sort.as_str().to_string()),
            direction: Some(self.direction.as_str().to_string()),
            page: Some(self.page.to_string()),
            page_size: Some(page_size.to_string()),
        }
    }

    /// Same filters with the page reset to 1.
    fn reset_page(mut self) -> Self {
        self.page = 1;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    FetchedOk,
    FetchError,
}

/// Named transitions. Everything except [`Action::GoToPage`] and
/// [`Action::Retry`] resets the page to 1.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetSearch(String),
    ToggleCategory(String),
    SetCategories(BTreeSet<String>),
    SetPriceRange {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    SetSort {
        key: SortKey,
        direction: SortDirection,
    },
    RemoveTag(FilterTag),
    ClearFilters,
    GoToPage(u32),
    Retry,
}

/// What the driver should do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Immediate,
    Debounced(Duration),
    /// Nothing changed; no fetch needed.
    Skip,
}

/// A fetch the driver must perform. Its result is handed back to
/// [`BrowseState::complete`] together with `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub request: FilterRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Unavailable(String),
    TimedOut,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "catalog unavailable: {reason}"),
            Self::TimedOut => write!(f, "catalog request timed out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer fetch was issued; the response was discarded.
    Stale,
}

#[derive(Debug, Clone)]
pub struct BrowseState {
    filters: FilterState,
    page_size: u32,
    phase: Phase,
    seq: u64,
    last_page: Option<ResultPage<Product>>,
    error: Option<FetchFailure>,
    facets: Vec<CategoryFacet>,
}

impl BrowseState {
    #[must_use]
    pub fn new(filters: FilterState, page_size: u32) -> Self {
        Self {
            filters,
            page_size: page_size.max(1),
            phase: Phase::Idle,
            seq: 0,
            last_page: None,
            error: None,
            facets: Vec::new(),
        }
    }

    /// Start from a URL query string read at load time.
    #[must_use]
    pub fn from_url(query: &str, page_size: u32) -> Self {
        Self::new(url::from_query_string(query), page_size)
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sequence number of the most recently issued fetch.
    #[must_use]
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn last_page(&self) -> Option<&ResultPage<Product>> {
        self.last_page.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn facets(&self) -> &[CategoryFacet] {
        &self.facets
    }

    /// Apply `action` and report how the driver should fetch.
    pub fn dispatch(&mut self, action: Action) -> Schedule {
        let before = self.filters.clone();
        let mut schedule = Schedule::Immediate;

        let next = match action {
            Action::SetSearch(text) => {
                schedule = Schedule::Debounced(SEARCH_DEBOUNCE);
                FilterState {
                    search: text,
                    ..before.clone()
                }
                .reset_page()
            }
            Action::ToggleCategory(name) => {
                let mut next = before.clone().reset_page();
                let name = name.trim();
                if !name.is_empty() && !next.categories.remove(name) {
                    next.categories.insert(name.to_owned());
                }
                next
            }
            Action::SetCategories(categories) => FilterState {
                categories: categories
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect(),
                ..before.clone()
            }
            .reset_page(),
            Action::SetPriceRange { min, max } => {
                schedule = Schedule::Debounced(PRICE_DEBOUNCE);
                FilterState {
                    price_min: min,
                    price_max: max,
                    ..before.clone()
                }
                .reset_page()
            }
            Action::SetSort { key, direction } => FilterState {
                sort: key,
                direction,
                ..before.clone()
            }
            .reset_page(),
            Action::RemoveTag(tag) => {
                let mut next = before.clone().reset_page();
                match tag {
                    FilterTag::Search(_) => next.search.clear(),
                    FilterTag::Category(name) => {
                        next.categories.remove(&name);
                    }
                    FilterTag::Price { .. } => {
                        next.price_min = None;
                        next.price_max = None;
                    }
                }
                next
            }
            Action::ClearFilters => FilterState {
                sort: before.sort,
                direction: before.direction,
                ..FilterState::default()
            },
            Action::GoToPage(page) => {
                let known_total = self.last_page.as_ref().map(|p| p.total_pages);
                if page < 1 || page == before.page || known_total.is_some_and(|t| page > t) {
                    return Schedule::Skip;
                }
                FilterState {
                    page,
                    ..before.clone()
                }
            }
            Action::Retry => return Schedule::Immediate,
        };

        if next == before {
            return Schedule::Skip;
        }
        self.filters = next;
        schedule
    }

    /// Issue a new fetch for the current filters. Any fetch still in flight
    /// becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.seq += 1;
        self.phase = Phase::Fetching;
        FetchTicket {
            seq: self.seq,
            request: self.filters.to_request(self.page_size),
        }
    }

    /// Apply a fetch result if `seq` is current.
    ///
    /// On success the server-reported page replaces the client's. On failure
    /// the previous page stays visible and the error is recorded.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<ResultPage<Product>, FetchFailure>,
    ) -> Completion {
        if seq != self.seq {
            return Completion::Stale;
        }
        match result {
            Ok(page) => {
                self.filters.page = page.page;
                self.last_page = Some(page);
                self.error = None;
                self.phase = Phase::FetchedOk;
            }
            Err(failure) => {
                self.error = Some(failure);
                self.phase = Phase::FetchError;
            }
        }
        Completion::Applied
    }

    pub fn set_facets(&mut self, facets: Vec<CategoryFacet>) {
        self.facets = rank_facets(facets);
    }

    /// Drops every count while keeping the category names, for when counts
    /// for the current filters could not be fetched.
    pub fn clear_facet_counts(&mut self) {
        let uncounted = std::mem::take(&mut self.facets)
            .into_iter()
            .map(|f| CategoryFacet::uncounted(f.name))
            .collect();
        self.facets = rank_facets(uncounted);
    }

    #[must_use]
    pub fn view(&self) -> View {
        render(self)
    }
}

#[cfg(test)]
#[path = "browse_test.rs"]
mod tests;
