//! Filter state <-> URL query string.
//!
//! Only non-default values are written. Reading goes through the same
//! coercion as the server, so a forged or stale link degrades to defaults
//! instead of failing.

use crate::catalog::{build_query, FilterRequest, SortDirection, SortKey, Surface};
use crate::querystring;

use super::FilterState;

/// Serialize `state` into a query string without a leading `?`.
#[must_use]
pub fn to_query_string(state: &FilterState) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();

    let search = state.search.trim();
    if !search.is_empty() {
        pairs.push(("search", querystring::encode(search)));
    }
    if !state.categories.is_empty() {
        let joined = state
            .categories
            .iter()
            .map(String::as_str)
            .map(querystring::encode)
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("categories", joined));
    }
    if let Some(min) = state.price_min {
        pairs.push(("price_min", min.normalize().to_string()));
    }
    if let Some(max) = state.price_max {
        pairs.push(("price_max", max.normalize().to_string()));
    }
    if state.sort != SortKey::Name {
        pairs.push(("sort", state.sort.as_str().to_string()));
    }
    if state.direction != SortDirection::Asc {
        pairs.push(("direction", state.direction.as_str().to_string()));
    }
    if state.page > 1 {
        pairs.push(("page", state.page.to_string()));
    }

    querystring::join(&pairs)
}

/// Restore filter state from a query string read at load time.
#[must_use]
pub fn from_query_string(query: &str) -> FilterState {
    let request = FilterRequest::from_query(query);
    let plan = build_query(&request, Surface::Storefront, 1);
    FilterState {
        search: plan
            .search
            .as_ref()
            .and_then(|_| request.search.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        categories: plan.categories.into_iter().collect(),
        price_min: plan.price_min,
        price_max: plan.price_max,
        sort: plan.sort,
        direction: plan.direction,
        page: plan.page,
    }
}
